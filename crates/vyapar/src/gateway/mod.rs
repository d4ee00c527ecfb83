pub mod upi;
pub mod whatsapp;

pub use upi::{UpiGateway, UpiProvider};
pub use whatsapp::WhatsAppClient;
