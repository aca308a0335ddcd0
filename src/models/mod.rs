pub mod commission;
pub mod monthly;
pub mod production;
pub mod roster;
pub mod targets;

pub use commission::{NormalizedCommission, Role, SplitCommission};
pub use monthly::{MonthlyFinancing, MonthlyKey};
pub use production::StoreProduction;
pub use roster::EmployeeRecord;
pub use targets::SalesTarget;
