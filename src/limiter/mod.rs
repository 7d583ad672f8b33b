pub mod invoker;
pub mod period;
pub mod quota_gate;

pub use invoker::GatedInvoker;
pub use period::PeriodUnit;
pub use quota_gate::{Permit, QuotaGate};
