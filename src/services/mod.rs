pub mod billing;
pub mod reply;

pub use billing::{PaymentError, PaymentGateway, PlanType, StripeClient};
pub use reply::{CompletionClient, OpenAiClient, ReplyGenerator};
