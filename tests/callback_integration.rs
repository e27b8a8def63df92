//! End-to-end callback flows through the router with in-memory adapters.
//!
//! Each test drives a provider request the way the CGI and HTTP fronts do:
//! build an envelope, dispatch it by endpoint name, inspect the reply and
//! what reached the billing core.

use std::sync::Arc;

use billmgr_plugins::adapters::memory::{InMemoryBillingCore, ScriptedProviderHttp};
use billmgr_plugins::application::callback::{CallbackRouter, Endpoint};
use billmgr_plugins::config::AppConfig;
use billmgr_plugins::domain::foundation::ElId;
use billmgr_plugins::domain::payment::{CallbackEnvelope, MethodConfig, PaymentRecord, PaymentTransition};
use billmgr_plugins::domain::signature::{NotificationSigner, OrderedParams, ResultHash, HASH_FIELD};
use billmgr_plugins::ports::SystemClock;

// =============================================================================
// Test Infrastructure
// =============================================================================

const PRV_ID: &str = "2042";
const NOTIFY_PASSWORD: &str = "notify-pass";
const PAYMASTER_SECRET: &str = "pm-secret";

fn qiwi_payment(elid: &str, amount: &str) -> PaymentRecord {
    let method = MethodConfig::new()
        .with("PRV_ID", PRV_ID)
        .with("NOTIFY_PASSWORD", NOTIFY_PASSWORD);
    PaymentRecord::new(ElId::parse("elid", elid).unwrap(), amount, "RUB").with_method(method)
}

fn paymaster_payment(elid: &str) -> PaymentRecord {
    let method = MethodConfig::new()
        .with("LMI_MERCHANT_ID", "m-1")
        .with("secret", PAYMASTER_SECRET);
    PaymentRecord::new(ElId::parse("elid", elid).unwrap(), "99.90", "RUB").with_method(method)
}

fn router(core: Arc<InMemoryBillingCore>) -> CallbackRouter {
    CallbackRouter::new(
        core,
        Arc::new(ScriptedProviderHttp::new()),
        Arc::new(SystemClock),
        &AppConfig::default(),
    )
}

fn qiwi_params(bill_id: &str, status: &str, amount: &str) -> OrderedParams {
    OrderedParams::new()
        .with("bill_id", bill_id)
        .with("status", status)
        .with("error", "0")
        .with("amount", amount)
        .with("user", "tel:+79000000000")
        .with("prv_name", "Hosting")
        .with("ccy", "RUB")
        .with("comment", bill_id)
        .with("command", "bill")
}

fn signed_qiwi(params: OrderedParams) -> CallbackEnvelope {
    let signer = NotificationSigner::new(PRV_ID, NOTIFY_PASSWORD);
    let signature = signer.sign(&params);
    CallbackEnvelope::new(params)
        .with_signature(signature)
        .with_authorization(signer.expected_authorization())
}

fn paymaster_notification(elid: &str, amount: &str) -> OrderedParams {
    let params = OrderedParams::new()
        .with("LMI_MERCHANT_ID", "m-1")
        .with("LMI_PAYMENT_NO", elid)
        .with("LMI_SYS_PAYMENT_ID", "sys-881")
        .with("LMI_SYS_PAYMENT_DATE", "2024-03-01T12:00:00")
        .with("LMI_PAYMENT_AMOUNT", amount)
        .with("LMI_CURRENCY", "RUB")
        .with("LMI_PAID_AMOUNT", amount)
        .with("LMI_PAID_CURRENCY", "RUB")
        .with("LMI_PAYMENT_SYSTEM", "3")
        .with("LMI_SIM_MODE", "0");
    let hash = ResultHash::new(PAYMASTER_SECRET).compute(&params);
    params.with(HASH_FIELD, hash)
}

// =============================================================================
// QIWI notifications
// =============================================================================

#[tokio::test]
async fn qiwi_paid_notification_marks_payment_paid() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(qiwi_payment("77", "150.00")));

    let response = router(core.clone())
        .dispatch(Endpoint::QiwiPullResult, &signed_qiwi(qiwi_params("77", "paid", "150.00")))
        .await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains("<result_code>0</result_code>"));
    assert_eq!(core.commands(), vec!["payment.info", "payment.setpaid"]);
    assert_eq!(core.payment_state("77"), Some(PaymentTransition::SetPaid));
}

#[tokio::test]
async fn qiwi_tampered_signature_never_reaches_transition() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(qiwi_payment("77", "150.00")));
    let signer = NotificationSigner::new(PRV_ID, NOTIFY_PASSWORD);
    let original = qiwi_params("77", "rejected", "150.00");
    let signature = signer.sign(&original);
    let tampered = original.with("status", "paid");
    let envelope = CallbackEnvelope::new(tampered)
        .with_signature(signature)
        .with_authorization(signer.expected_authorization());

    let response = router(core.clone())
        .dispatch(Endpoint::QiwiPullResult, &envelope)
        .await;

    assert!(response.body.contains("<result_code>151</result_code>"));
    assert!(response.body.contains("<description>invalid signature</description>"));
    assert_eq!(core.effective_transitions(), 0);
    assert_eq!(core.call_count("payment.setpaid"), 0);
}

#[tokio::test]
async fn qiwi_amount_mismatch_applies_nothing() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(qiwi_payment("77", "150.00")));

    let response = router(core.clone())
        .dispatch(Endpoint::QiwiPullResult, &signed_qiwi(qiwi_params("77", "paid", "15.00")))
        .await;

    assert!(response.body.contains("<result_code>5</result_code>"));
    for command in ["payment.setpaid", "payment.setinpay", "payment.setnopay"] {
        assert_eq!(core.call_count(command), 0, "{}", command);
    }
}

#[tokio::test]
async fn qiwi_waiting_then_paid_moves_forward() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(qiwi_payment("77", "150.00")));
    let router = router(core.clone());

    router
        .dispatch(Endpoint::QiwiPullResult, &signed_qiwi(qiwi_params("77", "waiting", "150.00")))
        .await;
    assert_eq!(core.payment_state("77"), Some(PaymentTransition::SetInPay));

    router
        .dispatch(Endpoint::QiwiPullResult, &signed_qiwi(qiwi_params("77", "paid", "150.00")))
        .await;
    assert_eq!(core.payment_state("77"), Some(PaymentTransition::SetPaid));
}

#[tokio::test]
async fn qiwi_repeated_notification_is_idempotent() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(qiwi_payment("77", "150.00")));
    let router = router(core.clone());
    let envelope = signed_qiwi(qiwi_params("77", "paid", "150.00"));

    let first = router.dispatch(Endpoint::QiwiPullResult, &envelope).await;
    let second = router.dispatch(Endpoint::QiwiPullResult, &envelope).await;

    assert_eq!(first, second);
    assert_eq!(core.payment_state("77"), Some(PaymentTransition::SetPaid));
    assert_eq!(core.effective_transitions(), 1);
}

// =============================================================================
// PayMaster payment notifications
// =============================================================================

#[tokio::test]
async fn paymaster_result_marks_payment_paid() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(paymaster_payment("31")));

    let response = router(core.clone())
        .dispatch(
            Endpoint::PayMasterResult,
            &CallbackEnvelope::new(paymaster_notification("31", "99.90")),
        )
        .await;

    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());
    assert_eq!(core.payment_state("31"), Some(PaymentTransition::SetPaid));
}

#[tokio::test]
async fn paymaster_result_with_wrong_hash_is_forbidden() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(paymaster_payment("31")));
    let params = paymaster_notification("31", "99.90").with(HASH_FIELD, "AAAA");

    let response = router(core.clone())
        .dispatch(Endpoint::PayMasterResult, &CallbackEnvelope::new(params))
        .await;

    assert_eq!(response.status, 403);
    assert_eq!(core.effective_transitions(), 0);
}

#[tokio::test]
async fn paymaster_result_with_core_down_asks_for_retry() {
    let core = Arc::new(InMemoryBillingCore::new().with_payment(paymaster_payment("31")));
    core.fail_on(
        "payment.setpaid",
        billmgr_plugins::domain::foundation::BillingError::billing_core("mgrctl exited with 1"),
    );

    let response = router(core.clone())
        .dispatch(
            Endpoint::PayMasterResult,
            &CallbackEnvelope::new(paymaster_notification("31", "99.90")),
        )
        .await;

    assert_eq!(response.status, 502);
    assert!(response.body.contains(r#"type="upstream""#));
}
