// tests/scenarios.rs
//
// Cenários ponta a ponta sobre o router HTTP, com backend em memória.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use sst_hub::{
    app,
    config::{AppState, Config},
    db::{MemoryBackend, MemorySlotStorage, SlotStorage},
    services::session_gate::{GateState, SessionGate},
};

const ADMIN_EMAIL: &str = "admin@sst.com";

struct Harness {
    router: Router,
    state: AppState,
    slots: Arc<MemorySlotStorage>,
}

fn setup() -> Harness {
    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some("segredo-dos-testes".into()),
        "ADMIN_EMAILS" => Some(ADMIN_EMAIL.into()),
        "BCRYPT_COST" => Some("4".into()),
        "PUBLIC_BASE_URL" => Some("https://sst.example".into()),
        "BACKEND_TIMEOUT_SECS" => Some("2".into()),
        _ => None,
    })
    .expect("configuração de teste");

    let slots = Arc::new(MemorySlotStorage::new());
    let state = AppState::with_parts(config, Arc::new(MemoryBackend::new()), slots.clone());
    Harness {
        router: app(state.clone()),
        state,
        slots,
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    business: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    if let Some(b) = business {
        builder = builder.header("x-business-id", b.to_string());
    }
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        json!(null)
    } else {
        serde_json::from_slice(&bytes).unwrap_or(json!(null))
    };
    (status, json)
}

async fn register(router: &Router, email: &str) -> String {
    let (s, body) = call(
        router,
        "POST",
        "/api/auth/register",
        None,
        None,
        Some(json!({ "email": email, "password": "senha123", "name": "Teste" })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED, "{body}");
    body["token"].as_str().expect("token").to_string()
}

async fn me_id(router: &Router, token: &str) -> Uuid {
    let (s, body) = call(router, "GET", "/api/users/me", Some(token), None, None).await;
    assert_eq!(s, StatusCode::OK);
    body["profile"]["id"].as_str().expect("id").parse().expect("uuid")
}

// Admin aprovado + um negócio criado por ele
async fn admin_with_business(router: &Router) -> (String, Uuid) {
    let token = register(router, ADMIN_EMAIL).await;
    let (s, body) = call(
        router,
        "POST",
        "/api/businesses",
        Some(&token),
        None,
        Some(json!({ "name": "Clínica Central" })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED, "{body}");
    let business = body["id"].as_str().expect("id").parse().expect("uuid");
    (token, business)
}

// Membro aprovado pelo admin, sem nenhuma concessão
async fn approved_member(router: &Router, admin: &str, email: &str) -> (String, Uuid) {
    let token = register(router, email).await;
    let id = me_id(router, &token).await;
    let (s, _) = call(
        router,
        "POST",
        &format!("/api/admin/profiles/{id}/approve"),
        Some(admin),
        None,
        None,
    )
    .await;
    assert_eq!(s, StatusCode::OK);
    (token, id)
}

// ── Cenário A: empresa normalizada e encontrada pela busca ──

#[tokio::test]
async fn company_is_stored_canonical_and_searchable() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    let (s, created) = call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "ACME", "cnpj": "11222333000181" })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED, "{created}");
    assert_eq!(created["cnpj"], "11.222.333/0001-81");

    let (s, list) = call(&h.router, "GET", "/api/companies?q=acme", Some(&admin), Some(business), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["id"], created["id"]);

    let (_, none) = call(&h.router, "GET", "/api/companies?q=zzz", Some(&admin), Some(business), None).await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn short_tax_id_is_rejected_with_field_details() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    let (s, body) = call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "ACME", "cnpj": "123" })),
    )
    .await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "record_invalid");
    assert_eq!(body["details"]["cnpj"], json!(["incomplete_tax_id"]));
}

// ── Cenário B: colaborador com empresa inexistente ──

#[tokio::test]
async fn employee_with_unknown_company_is_not_created() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    let (s, body) = call(
        &h.router,
        "POST",
        "/api/employees",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "João", "cpf": "52998224725", "companyId": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["companyId"], json!(["company_not_selected"]));

    let (_, list) = call(&h.router, "GET", "/api/employees", Some(&admin), Some(business), None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn employee_listing_resolves_company_name() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    let (_, company) = call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "Metalúrgica Silva", "cnpj": "11222333000181" })),
    )
    .await;
    let (s, employee) = call(
        &h.router,
        "POST",
        "/api/employees",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "João", "cpf": "52998224725", "companyId": company["id"] })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED, "{employee}");
    assert_eq!(employee["cpf"], "529.982.247-25");
    assert_eq!(employee["status"], "ACTIVE");

    let (_, list) = call(&h.router, "GET", "/api/employees?q=silva", Some(&admin), Some(business), None).await;
    assert_eq!(list[0]["companyName"], "Metalúrgica Silva");
}

// ── Cenário C: aprovação observada pela sessão aberta ──

#[tokio::test]
async fn approval_reaches_open_session_without_relogin() {
    let h = setup();
    let (admin, _) = admin_with_business(&h.router).await;

    let user = register(&h.router, "novo@sst.com").await;
    let user_id = me_id(&h.router, &user).await;

    let (s, body) = call(&h.router, "GET", "/api/businesses", Some(&user), None, None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "access_pending");

    let gate = SessionGate::open(h.state.backend.clone(), user_id, Duration::from_secs(2));
    assert_eq!(gate.settled().await, GateState::AwaitingApproval);
    let mut rx = gate.watch();
    rx.borrow_and_update();

    let (s, profile) = call(
        &h.router,
        "POST",
        &format!("/api/admin/profiles/{user_id}/approve"),
        Some(&admin),
        None,
        None,
    )
    .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(profile["approved"], true);

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("a sessão não viu a aprovação")
        .expect("portão encerrado");
    assert_eq!(*rx.borrow(), GateState::Granted);

    // mesmo token, sem novo login
    let (s, _) = call(&h.router, "GET", "/api/businesses", Some(&user), None, None).await;
    assert_eq!(s, StatusCode::OK);
}

#[tokio::test]
async fn session_watch_is_an_event_stream() {
    let h = setup();
    let user = register(&h.router, "novo@sst.com").await;

    let req = Request::builder()
        .uri("/api/session/watch")
        .header(header::AUTHORIZATION, format!("Bearer {user}"))
        .body(Body::empty())
        .unwrap();
    let resp = h.router.clone().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");

    let (s, body) = call(&h.router, "GET", "/api/session", Some(&user), None, None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(body["state"], "AWAITING_APPROVAL");
}

#[tokio::test]
async fn admins_cannot_revoke_or_delete_themselves() {
    let h = setup();
    let (admin, _) = admin_with_business(&h.router).await;
    let admin_id = me_id(&h.router, &admin).await;

    let (s, body) = call(
        &h.router,
        "POST",
        &format!("/api/admin/profiles/{admin_id}/revoke"),
        Some(&admin),
        None,
        None,
    )
    .await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "action_not_permitted");

    let (s, body) = call(
        &h.router,
        "DELETE",
        &format!("/api/admin/profiles/{admin_id}?confirm=true"),
        Some(&admin),
        None,
        None,
    )
    .await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "action_not_permitted");

    let (_, me) = call(&h.router, "GET", "/api/users/me", Some(&admin), None, None).await;
    assert_eq!(me["profile"]["approved"], true);
}

#[tokio::test]
async fn members_are_not_admins() {
    let h = setup();
    let (admin, _) = admin_with_business(&h.router).await;
    let (member, _) = approved_member(&h.router, &admin, "membro@sst.com").await;

    let (s, body) = call(&h.router, "GET", "/api/admin/profiles", Some(&member), None, None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_admin");
}

#[tokio::test]
async fn destructive_calls_need_confirmation() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;
    let (_, company) = call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "ACME", "cnpj": "11222333000181" })),
    )
    .await;
    let uri = format!("/api/companies/{}", company["id"].as_str().expect("id"));

    let (s, body) = call(&h.router, "DELETE", &uri, Some(&admin), Some(business), None).await;
    assert_eq!(s, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(body["code"], "confirmation_required");

    let (s, _) = call(&h.router, "DELETE", &format!("{uri}?confirm=true"), Some(&admin), Some(business), None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);

    let (s, _) = call(&h.router, "GET", &uri, Some(&admin), Some(business), None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}

// ── Permissões: negar por padrão, concessões valem após reload ──

#[tokio::test]
async fn grants_take_effect_after_reload() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;
    let (member, member_id) = approved_member(&h.router, &admin, "membro@sst.com").await;

    let (s, body) = call(&h.router, "GET", "/api/companies", Some(&member), Some(business), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");

    let (s, _) = call(
        &h.router,
        "POST",
        &format!("/api/admin/profiles/{member_id}/grant-all"),
        Some(&admin),
        None,
        Some(json!({ "businessId": business })),
    )
    .await;
    assert_eq!(s, StatusCode::OK);

    // ainda em cache
    let (s, _) = call(&h.router, "GET", "/api/companies", Some(&member), Some(business), None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);

    let (s, perms) = call(&h.router, "POST", "/api/permissions/reload", Some(&member), Some(business), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(perms["isOwner"], false);
    assert_eq!(perms["grants"].as_array().map(Vec::len), Some(70));

    let (s, _) = call(&h.router, "GET", "/api/companies", Some(&member), Some(business), None).await;
    assert_eq!(s, StatusCode::OK);

    let (_, check) = call(
        &h.router,
        "GET",
        "/api/permissions/check?module=reports&action=delete",
        Some(&member),
        Some(business),
        None,
    )
    .await;
    assert_eq!(check["allowed"], true);
}

#[tokio::test]
async fn business_header_is_required_for_records() {
    let h = setup();
    let (admin, _) = admin_with_business(&h.router).await;

    let (s, body) = call(&h.router, "GET", "/api/companies", Some(&admin), None, None).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_business");
}

// ── Cenário D: validação pública ──

#[tokio::test]
async fn unknown_and_malformed_codes_get_the_same_not_found() {
    let h = setup();

    let (s1, unknown) = call(&h.router, "GET", "/validate-doc/ABCDEF123456", None, None, None).await;
    let (s2, malformed) = call(&h.router, "GET", "/validate-doc/%20%3B--", None, None, None).await;
    let (s3, cert) = call(&h.router, "GET", "/validate-cert/ABCDEF123456", None, None, None).await;

    assert_eq!(s1, StatusCode::NOT_FOUND);
    assert_eq!((s2, s3), (StatusCode::NOT_FOUND, StatusCode::NOT_FOUND));
    assert_eq!(unknown["code"], "not_found");
    assert_eq!(unknown, malformed);
    assert_eq!(unknown, cert);
}

#[tokio::test]
async fn issued_document_is_public_until_invalidated() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    let (s, issued) = call(
        &h.router,
        "POST",
        "/api/validations/documents",
        Some(&admin),
        Some(business),
        Some(json!({ "documentName": "PGR 2025", "documentType": "PGR", "issuer": "Eng. Ana" })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED, "{issued}");
    let code = issued["validationCode"].as_str().expect("código").to_string();
    assert_eq!(issued["publicUrl"], format!("https://sst.example/validate-doc/{code}"));

    let (s, public) = call(&h.router, "GET", &format!("/validate-doc/{code}"), None, None, None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(public["isValid"], true);
    assert!(public.get("businessId").is_none());

    let req = Request::builder()
        .uri(format!("/api/validations/documents/{code}/qrcode.png"))
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .header("x-business-id", business.to_string())
        .body(Body::empty())
        .unwrap();
    let resp = h.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");

    for _ in 0..2 {
        let (s, _) = call(
            &h.router,
            "POST",
            &format!("/api/validations/documents/{code}/invalidate"),
            Some(&admin),
            Some(business),
            None,
        )
        .await;
        assert_eq!(s, StatusCode::NO_CONTENT);
    }

    let (_, public) = call(&h.router, "GET", &format!("/validate-doc/{code}"), None, None, None).await;
    assert_eq!(public["isValid"], false);
    assert_eq!(public["documentName"], "PGR 2025");
}

// ── Backup e busca ──

#[tokio::test]
async fn backup_round_trips_between_businesses() {
    let h = setup();
    let (admin, origin) = admin_with_business(&h.router).await;
    let (_, other) = call(
        &h.router,
        "POST",
        "/api/businesses",
        Some(&admin),
        None,
        Some(json!({ "name": "Filial" })),
    )
    .await;
    let target: Uuid = other["id"].as_str().expect("id").parse().expect("uuid");

    call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(origin),
        Some(json!({ "name": "ACME", "cnpj": "11222333000181" })),
    )
    .await;

    let (s, backup) = call(&h.router, "GET", "/api/backup", Some(&admin), Some(origin), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(backup["version"], "1.0");

    let (s, body) = call(&h.router, "POST", "/api/backup", Some(&admin), Some(target), Some(backup.clone())).await;
    assert_eq!(s, StatusCode::PRECONDITION_REQUIRED, "{body}");

    let (s, summary) = call(
        &h.router,
        "POST",
        "/api/backup?confirm=true",
        Some(&admin),
        Some(target),
        Some(backup),
    )
    .await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(summary, json!({ "companies": 1, "employees": 0 }));

    let (s, body) = call(
        &h.router,
        "POST",
        "/api/backup?confirm=true",
        Some(&admin),
        Some(target),
        Some(json!({ "data": {} })),
    )
    .await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_backup");

    let (_, hits) = call(&h.router, "GET", "/api/search?q=acm", Some(&admin), Some(target), None).await;
    assert_eq!(hits["companies"].as_array().map(Vec::len), Some(1));
    let (_, hits) = call(&h.router, "GET", "/api/search?q=ac", Some(&admin), Some(target), None).await;
    assert_eq!(hits["companies"], json!([]));
}

#[tokio::test]
async fn messages_follow_accept_language() {
    let h = setup();

    let req = Request::builder()
        .uri("/api/users/me")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .body(Body::empty())
        .unwrap();
    let resp = h.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let en: Value = serde_json::from_slice(&bytes).unwrap();

    let (_, pt) = call(&h.router, "GET", "/api/users/me", None, None, None).await;

    assert_eq!(en["code"], "invalid_token");
    assert_eq!(pt["code"], "invalid_token");
    assert_ne!(en["error"], pt["error"]);
}

// ── Integridade dos dados locais ──

#[tokio::test]
async fn unreadable_slot_entries_survive_new_writes() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;
    call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "ACME", "cnpj": "11222333000181" })),
    )
    .await;

    // Registro gravado por uma versão antiga, sem cnpj nem data
    let key = format!("{business}.companies");
    let raw = h.slots.get(&key).unwrap().expect("slot gravado");
    let mut items: Vec<Value> = serde_json::from_str(&raw).unwrap();
    items.push(json!({ "id": "legado-1", "name": "Antiga" }));
    h.slots.set(&key, &serde_json::to_string(&items).unwrap()).unwrap();

    let (s, list) = call(&h.router, "GET", "/api/companies", Some(&admin), Some(business), None).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (s, _) = call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "Beta", "cnpj": "11444777000161" })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED);

    let (_, list) = call(&h.router, "GET", "/api/companies", Some(&admin), Some(business), None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(2));

    let raw = h.slots.get(&key).unwrap().expect("slot gravado");
    let items: Vec<Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().any(|item| item["id"] == "legado-1"));
}

#[tokio::test]
async fn employee_with_blank_or_malformed_company_gets_field_details() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    for company in ["", "abc"] {
        let (s, body) = call(
            &h.router,
            "POST",
            "/api/employees",
            Some(&admin),
            Some(business),
            Some(json!({ "name": "João", "cpf": "52998224725", "companyId": company })),
        )
        .await;
        assert_eq!(s, StatusCode::BAD_REQUEST, "{company:?}: {body}");
        assert_eq!(body["code"], "record_invalid");
        assert_eq!(body["details"]["companyId"], json!(["company_not_selected"]));
    }
}

#[tokio::test]
async fn whitespace_only_required_fields_are_rejected() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    let (s, body) = call(
        &h.router,
        "POST",
        "/api/validations/documents",
        Some(&admin),
        Some(business),
        Some(json!({ "documentName": "   ", "documentType": "ASO" })),
    )
    .await;
    assert_eq!(s, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "validation_error");
    assert!(body["details"]["document_name"].is_array());
    assert!(body["details"].get("document_type").is_none());
}

#[tokio::test]
async fn backup_with_invalid_records_is_rejected_whole() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;

    let backup = json!({
        "version": "1.0",
        "businessId": business,
        "exportedAt": "2026-01-01T00:00:00Z",
        "data": {
            "companies": [
                {
                    "id": Uuid::new_v4(),
                    "name": "ACME",
                    "cnpj": "11222333000181",
                    "createdAt": "2026-01-01T00:00:00Z"
                },
                {
                    "id": Uuid::new_v4(),
                    "name": "",
                    "cnpj": "123",
                    "createdAt": "2026-01-01T00:00:00Z"
                }
            ],
            "employees": []
        }
    });

    let (s, body) = call(
        &h.router,
        "POST",
        "/api/backup?confirm=true",
        Some(&admin),
        Some(business),
        Some(backup),
    )
    .await;
    assert_eq!(s, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "invalid_backup");

    assert!(h.state.company_service.list(business, None).is_empty());
}

// ── Exclusões levam os dados locais junto ──

#[tokio::test]
async fn deleting_an_owner_wipes_their_business_data() {
    let h = setup();
    let (admin, _) = admin_with_business(&h.router).await;
    let (member, member_id) = approved_member(&h.router, &admin, "dono@sst.com").await;

    let (s, body) = call(
        &h.router,
        "POST",
        "/api/businesses",
        Some(&member),
        None,
        Some(json!({ "name": "Clínica do Membro" })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED, "{body}");
    let owned: Uuid = body["id"].as_str().expect("id").parse().expect("uuid");

    let (s, body) = call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&member),
        Some(owned),
        Some(json!({ "name": "ACME", "cnpj": "11222333000181" })),
    )
    .await;
    assert_eq!(s, StatusCode::CREATED, "{body}");
    assert_eq!(h.state.company_service.list(owned, None).len(), 1);

    let (s, _) = call(
        &h.router,
        "DELETE",
        &format!("/api/admin/profiles/{member_id}?confirm=true"),
        Some(&admin),
        None,
        None,
    )
    .await;
    assert_eq!(s, StatusCode::NO_CONTENT);

    assert!(h.state.company_service.list(owned, None).is_empty());
    assert_eq!(h.slots.get(&format!("{owned}.companies")).unwrap(), None);
}

#[tokio::test]
async fn only_the_owner_deletes_a_business() {
    let h = setup();
    let (admin, business) = admin_with_business(&h.router).await;
    let (member, _) = approved_member(&h.router, &admin, "membro@sst.com").await;
    call(
        &h.router,
        "POST",
        "/api/companies",
        Some(&admin),
        Some(business),
        Some(json!({ "name": "ACME", "cnpj": "11222333000181" })),
    )
    .await;
    let uri = format!("/api/businesses/{business}");

    let (s, body) = call(&h.router, "DELETE", &uri, Some(&admin), None, None).await;
    assert_eq!(s, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(body["code"], "confirmation_required");

    let (s, body) = call(&h.router, "DELETE", &format!("{uri}?confirm=true"), Some(&member), None, None).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "not_owner");
    assert_eq!(h.state.company_service.list(business, None).len(), 1);

    let (s, _) = call(&h.router, "DELETE", &format!("{uri}?confirm=true"), Some(&admin), None, None).await;
    assert_eq!(s, StatusCode::NO_CONTENT);

    let (_, mine) = call(&h.router, "GET", "/api/businesses", Some(&admin), None, None).await;
    assert_eq!(mine, json!([]));
    assert!(h.state.company_service.list(business, None).is_empty());

    let (s, _) = call(&h.router, "DELETE", &format!("{uri}?confirm=true"), Some(&admin), None, None).await;
    assert_eq!(s, StatusCode::NOT_FOUND);
}
