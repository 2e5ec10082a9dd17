// Service exports
pub mod notifier;
pub mod reasoning;
pub mod store;

pub use notifier::{destination_for, DeliveryReceipt, Notifier, NotifyError, UltraMsgClient};
pub use reasoning::{ChatCompletionsClient, DelegatedConstraints, ReasoningClient, ReasoningError};
pub use store::{ProfileStore, StoreError};
