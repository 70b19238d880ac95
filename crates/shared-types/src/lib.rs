pub mod types;
pub mod variant;

pub use types::{round_money, LineItem, ModelError, PartyProfile};
pub use variant::VariantSettings;
