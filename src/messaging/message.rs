//! Order lifecycle message payloads.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create an order, published by the portal and consumed by the
/// order-create worker
///
/// Field names are camelCase on the wire to stay compatible with existing
/// producers and consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateMessage {
    /// Tracks the order through asynchronous processing
    pub request_id: Uuid,
    pub member_id: i64,
    pub member_receive_address_id: i64,
    #[serde(default)]
    pub coupon_id: Option<i64>,
    /// Loyalty points to redeem
    #[serde(default)]
    pub use_integration: Option<i32>,
    pub pay_type: i32,
    /// Selected cart item ids
    pub cart_ids: Vec<i64>,
    /// Epoch milliseconds
    pub create_time: i64,
}

impl OrderCreateMessage {
    pub fn new(
        member_id: i64,
        member_receive_address_id: i64,
        pay_type: i32,
        cart_ids: Vec<i64>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            member_id,
            member_receive_address_id,
            coupon_id: None,
            use_integration: None,
            pay_type,
            cart_ids,
            create_time: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_coupon(mut self, coupon_id: i64) -> Self {
        self.coupon_id = Some(coupon_id);
        self
    }

    pub fn with_integration(mut self, points: i32) -> Self {
        self.use_integration = Some(points);
        self
    }

    /// Creation time, if `create_time` is a representable instant
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.create_time).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format_is_camel_case() {
        let message = OrderCreateMessage::new(7, 11, 1, vec![3, 4]).with_coupon(99);
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["memberId"], json!(7));
        assert_eq!(value["memberReceiveAddressId"], json!(11));
        assert_eq!(value["couponId"], json!(99));
        assert_eq!(value["cartIds"], json!([3, 4]));
        assert_eq!(value["requestId"], json!(message.request_id.to_string()));
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let message: OrderCreateMessage = serde_json::from_value(json!({
            "requestId": "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            "memberId": 1,
            "memberReceiveAddressId": 2,
            "payType": 0,
            "cartIds": [],
            "createTime": 1_700_000_000_000i64
        }))
        .unwrap();

        assert_eq!(message.coupon_id, None);
        assert_eq!(message.use_integration, None);
        assert_eq!(
            message.created_at().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }
}
