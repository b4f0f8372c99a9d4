//! Integration tests for Shopify store provisioning.
//!
//! Covers request parsing and validation, template conversion, the job
//! status machine and webhook payloads, without running the Shopify CLI.

use chrono::Utc;
use serde_json::json;

use merchdesk_admin::db::jobs::StoreJob;
use merchdesk_admin::provisioning::webhook::sign;
use merchdesk_admin::provisioning::{
    CreateStoreRequest, PopulateSource, StoreTemplate, WebhookPayload,
};
use merchdesk_admin::tables::StoreJobRow;
use merchdesk_core::{JobId, JobStatus, TenantId};

fn request(body: serde_json::Value) -> CreateStoreRequest {
    serde_json::from_value(body).expect("valid request body")
}

fn template_body() -> serde_json::Value {
    json!({
        "type": "template",
        "products": [
            {"title": "Pour-over Kettle", "price": 49, "tags": ["brewing"]},
            {"title": "Ceramic Dripper", "price": "24.5", "image_url": "https://cdn.acme.test/dripper.jpg"}
        ],
        "collections": [
            {"title": "Brewing", "products": ["pour-over-kettle", "ceramic-dripper"]}
        ],
        "pages": [
            {"title": "About us", "body_html": "<p>Small-batch coffee gear.</p>"}
        ]
    })
}

// =============================================================================
// Request Validation
// =============================================================================

#[test]
fn test_minimal_request_defaults_to_empty_store() {
    let mut req = request(json!({"store_name": "  Acme Coffee  "}));
    req.validate().expect("valid request");

    assert_eq!(req.store_name, "Acme Coffee");
    assert_eq!(req.populate, PopulateSource::None);
    assert!(req.webhook_url.is_none());
}

#[test]
fn test_template_request() {
    let mut req = request(json!({
        "store_name": "Acme Coffee",
        "webhook_url": "https://hooks.acme.test/stores",
        "populate": template_body()
    }));
    req.validate().expect("valid template");

    let PopulateSource::Template(template) = &req.populate else {
        panic!("expected a template source");
    };
    assert_eq!(template.item_count(), 4);
}

#[test]
fn test_invalid_requests() {
    let cases = [
        json!({"store_name": "ab"}),
        json!({"store_name": "Acme_Coffee!"}),
        json!({"store_name": "Acme Coffee", "webhook_url": "mailto:ops@acme.test"}),
        json!({"store_name": "Acme Coffee", "populate": {"type": "template"}}),
        json!({"store_name": "Acme Coffee", "populate": {"type": "generate", "niche": " ", "product_count": 3}}),
        json!({"store_name": "Acme Coffee", "populate": {"type": "generate", "niche": "tea", "product_count": 0}}),
        json!({
            "store_name": "Acme Coffee",
            "populate": {
                "type": "template",
                "products": [{"title": "Mug", "price": "12"}],
                "collections": [{"title": "Cups", "products": ["teapot"]}]
            }
        }),
    ];

    for body in cases {
        let mut req = request(body.clone());
        assert!(req.validate().is_err(), "accepted {body}");
    }
}

#[test]
fn test_unknown_populate_type_is_rejected_by_serde() {
    let result: Result<CreateStoreRequest, _> = serde_json::from_value(json!({
        "store_name": "Acme Coffee",
        "populate": {"type": "clone", "from": "other-store"}
    }));
    assert!(result.is_err());
}

// =============================================================================
// Template Conversion
// =============================================================================

#[test]
fn test_template_products_become_shopify_input() {
    let template: StoreTemplate = serde_json::from_value(template_body()).expect("template");

    let kettle = template.products.first().expect("first product");
    let input = kettle.to_shopify_input();
    assert_eq!(input.title.as_deref(), Some("Pour-over Kettle"));
    assert_eq!(input.handle.as_deref(), Some("pour-over-kettle"));
    assert_eq!(input.tags.as_deref(), Some("brewing"));
    assert!(input.images.is_none());

    let variants = input.variants.expect("one variant");
    assert_eq!(variants.len(), 1);
    assert_eq!(variants.first().map(|v| v.price.as_str()), Some("49.00"));

    let dripper = template.products.get(1).expect("second product").to_shopify_input();
    assert_eq!(
        dripper.variants.expect("variant").first().map(|v| v.price.clone()),
        Some("24.50".to_string())
    );
    assert_eq!(dripper.images.map(|images| images.len()), Some(1));
}

// =============================================================================
// Job Status Machine
// =============================================================================

#[test]
fn test_happy_path_transitions() {
    let path = [
        JobStatus::Pending,
        JobStatus::CreatingStore,
        JobStatus::Populating,
        JobStatus::Completed,
    ];
    for pair in path.windows(2) {
        if let [from, to] = pair {
            assert!(from.can_transition_to(*to), "{from} -> {to}");
        }
    }
}

#[test]
fn test_every_active_state_can_fail() {
    for status in [
        JobStatus::Pending,
        JobStatus::CreatingStore,
        JobStatus::Populating,
    ] {
        assert!(status.can_transition_to(JobStatus::Failed));
        assert!(!status.is_terminal());
    }
}

#[test]
fn test_terminal_states_are_final() {
    let all = [
        JobStatus::Pending,
        JobStatus::CreatingStore,
        JobStatus::Populating,
        JobStatus::Completed,
        JobStatus::Failed,
    ];
    for terminal in [JobStatus::Completed, JobStatus::Failed] {
        assert!(terminal.is_terminal());
        for next in all {
            assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
        }
    }
    assert!(!JobStatus::Pending.can_transition_to(JobStatus::Populating));
    assert!(!JobStatus::Populating.can_transition_to(JobStatus::Populating));
}

// =============================================================================
// Webhooks and Job Rows
// =============================================================================

fn finished_job(status: JobStatus) -> StoreJob {
    let now = Utc::now();
    StoreJob {
        id: JobId::generate(),
        tenant_id: TenantId::generate(),
        store_name: "Acme Coffee".to_string(),
        status,
        populate: json!({"type": "none"}),
        webhook_url: Some("https://hooks.acme.test/stores".to_string()),
        store_domain: Some("acme-coffee.myshopify.com".to_string()),
        admin_url: Some("https://admin.shopify.com/store/acme-coffee".to_string()),
        report: Some(json!({"products_created": 2, "errors": []})),
        error_message: None,
        webhook_attempts: 1,
        webhook_delivered_at: Some(now),
        created_at: now,
        updated_at: now,
        finished_at: Some(now),
    }
}

#[test]
fn test_completed_job_payload() {
    let job = finished_job(JobStatus::Completed);
    let payload = WebhookPayload::for_job(&job).expect("terminal job");
    let body = serde_json::to_value(&payload).expect("serializable");

    assert_eq!(body["event"], "store.completed");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["job_id"], json!(job.id));
    assert_eq!(body["store_domain"], "acme-coffee.myshopify.com");
    assert_eq!(body["report"]["products_created"], 2);
}

#[test]
fn test_running_job_has_no_payload() {
    let job = finished_job(JobStatus::CreatingStore);
    assert!(WebhookPayload::for_job(&job).is_none());
}

#[test]
fn test_signature_format() {
    let signature = sign(b"whsec_abc", 1_767_225_600, br#"{"event":"store.failed"}"#);
    let hex = signature.strip_prefix("sha256=").expect("prefixed");
    assert_eq!(hex.len(), 64);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(signature, sign(b"whsec_other", 1_767_225_600, br#"{"event":"store.failed"}"#));
}

#[test]
fn test_job_row_reads_report() {
    let row = StoreJobRow::from(finished_job(JobStatus::Completed));
    assert_eq!(row.products_created, Some(2));
    assert!(row.webhook_delivered);
    assert_eq!(row.status, JobStatus::Completed);
}
