use crate::domain::order::OrderContext;
use crate::error::Result;
use std::io::Read;

/// Reads the order summary handed over by the cart.
///
/// Expects `{"orderId": ..., "total": ..., "items": [...]}` and rejects orders
/// the payment step cannot charge.
pub fn read_order<R: Read>(source: R) -> Result<OrderContext> {
    let order: OrderContext = serde_json::from_reader(source)?;
    order.validate()?;
    Ok(order)
}
