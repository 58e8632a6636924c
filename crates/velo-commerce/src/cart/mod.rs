//! Cart data model: line items, applied coupons, shipping, fees, totals.

mod cart;
mod coupon;
mod item;
mod shipping;
mod totals;

pub use cart::{Cart, MAX_QUANTITY_PER_ITEM};
pub use coupon::AppliedCoupon;
pub use item::{derive_item_key, CartItem, ItemSnapshot};
pub use shipping::{CartFee, ShippingMethod};
pub use totals::CartTotals;
