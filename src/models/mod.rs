//! Domain models held in session state.
//!
//! These are plain serde structs mirroring the backend's wire shapes. The
//! backend owns persistence; everything here is a session-scoped copy that is
//! replaced wholesale after each reconciling fetch.

pub mod discount;
pub mod inquiry;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod user;

pub use discount::{Discount, DiscountKind, NewDiscount};
pub use inquiry::{Inquiry, InquiryStatus, NewInquiry};
pub use inventory::{CartLine, InventoryItem, NewInventoryItem};
pub use notification::{EmailMessage, Notification, NotificationKind};
pub use order::{CustomerDetails, Order, OrderLine, OrderStatus};
pub use user::{User, UserRole};
