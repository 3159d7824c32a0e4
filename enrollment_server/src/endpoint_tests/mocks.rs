use enrollment_engine::gateway::{GatewayError, PaymentGateway, RemoteOrder};
use lp_common::MinorUnits;
use mockall::mock;
use serde_json::Value;

mock! {
    pub FlakyGateway {}
    impl Clone for FlakyGateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGateway for FlakyGateway {
        fn is_mock(&self) -> bool;
        async fn create_remote_order(&self, amount: MinorUnits, currency: &str, receipt: &str) -> Result<RemoteOrder, GatewayError>;
        async fn fetch_remote_payment(&self, payment_id: &str) -> Result<Value, GatewayError>;
    }
}
