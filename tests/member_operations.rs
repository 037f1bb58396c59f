//! Client behaviour against an in-memory fake of the Hey Loyalty API
//!
//! The fake transport records every request, so the tests can assert how many
//! round trips an operation makes and exactly what was sent.

use heyloyalty::api::{HttpMethod, HttpRequest, HttpResponse};
use heyloyalty::{
    ClientConfig, Credentials, FieldValue, HeyLoyaltyClient, HeyLoyaltyError, List, ListFilter, Member, Transport,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const BASE: &str = "http://fake.heyloyalty.test/loyalty/v1";
const LIST_ID: u64 = 5;

fn metadata() -> Value {
    json!({
        "id": LIST_ID, "name": "Webshop", "country_id": 45, "date_format": "d-m-Y",
        "duplicates": "disallow",
        "fields": [
            {"id": 1, "name": "email", "label": "E-mail", "required_in_shop": 1,
             "type": "fixed", "type_id": 1, "format": "text"},
            {"id": 2, "name": "firstname", "label": "First name", "type": "fixed", "format": "text"},
            {"id": 3, "name": "password", "label": "Password", "type": "fixed", "format": "password"},
            {"id": 4, "name": "birthdate", "label": "Birthdate", "type": "fixed", "format": "date"},
            {"id": 5, "name": "sex", "label": "Sex", "type": "fixed", "format": "choice",
             "options": {"1": "Male", "2": "Female"}},
            {"id": 6, "name": "newsletter", "label": "Newsletter", "type": "custom", "format": "boolean"}
        ]
    })
}

fn member_record(n: usize) -> Value {
    json!({
        "id": format!("member-{n:05}"),
        "status": {"status": "active", "email": "subscribed", "mobile": "none"},
        "sent_mail": 3, "sent_sms": 0, "open_rate": 50, "imported": 0,
        "created_at": "2015-03-14 13:45:10", "updated_at": "2015-03-14 13:45:10",
        "email": format!("member{n}@example.com"),
        "firstname": "Member",
        "password": "",
        "birthdate": "0000-00-00",
        "sex": {"id": 2, "label": "Female"},
        "newsletter": "1"
    })
}

/// In-memory stand-in for the API that logs every request
struct FakeApi {
    members: Vec<Value>,
    requests: Mutex<Vec<HttpRequest>>,
    /// Status answered to writes
    write_status: u16,
    /// Largest page the server hands out, whatever was requested
    page_cap: Option<usize>,
}

impl FakeApi {
    fn with_members(count: usize) -> Arc<Self> {
        Arc::new(Self {
            members: (0..count).map(member_record).collect(),
            requests: Mutex::new(Vec::new()),
            write_status: 201,
            page_cap: None,
        })
    }

    fn with_page_cap(count: usize, cap: usize) -> Arc<Self> {
        Arc::new(Self {
            members: (0..count).map(member_record).collect(),
            requests: Mutex::new(Vec::new()),
            write_status: 201,
            page_cap: Some(cap),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn count(&self, method: HttpMethod, path: &str) -> usize {
        let url = format!("{BASE}{path}");
        self.requests().iter().filter(|r| r.method == method && r.url == url).count()
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let path = request.url.strip_prefix(BASE).unwrap_or(&request.url);
        let ok = |body: Value| HttpResponse { status: 200, body: body.to_string() };

        match (request.method, path) {
            (HttpMethod::Get, "/lists") => ok(json!([{"id": LIST_ID, "name": "Webshop"}])),
            (HttpMethod::Get, "/lists/5") => ok(metadata()),
            (HttpMethod::Get, "/lists/5/members") => {
                let page: usize = request.query_value("page").unwrap().parse().unwrap();
                let requested: usize = request.query_value("perpage").unwrap().parse().unwrap();
                let per_page = self.page_cap.map_or(requested, |cap| requested.min(cap));
                let email = request.query_value("filter[email][eq][]");

                let matching: Vec<&Value> = self
                    .members
                    .iter()
                    .filter(|m| email.map_or(true, |e| m["email"] == e))
                    .collect();
                let start = (page - 1) * per_page;
                let slice: Vec<&Value> = matching.into_iter().skip(start).take(per_page).collect();
                ok(json!({ "members": slice }))
            }
            (HttpMethod::Get, p) if p.starts_with("/lists/5/members/") => {
                let id = &p["/lists/5/members/".len()..];
                match self.members.iter().find(|m| m["id"] == id) {
                    Some(record) => ok(record.clone()),
                    None => HttpResponse { status: 404, body: "{\"error\":\"not found\"}".to_string() },
                }
            }
            (HttpMethod::Post, "/lists/5/members") => HttpResponse {
                status: self.write_status,
                body: json!({"id": "new-member-guid"}).to_string(),
            },
            (HttpMethod::Put | HttpMethod::Delete, _) => HttpResponse {
                status: self.write_status,
                body: "{}".to_string(),
            },
            _ => HttpResponse { status: 404, body: String::new() },
        }
    }
}

impl Transport for FakeApi {
    async fn send(&self, request: HttpRequest) -> heyloyalty::Result<HttpResponse> {
        let response = self.respond(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

fn client(api: &Arc<FakeApi>) -> HeyLoyaltyClient<Arc<FakeApi>> {
    let config = ClientConfig::builder().base_url(BASE).build();
    HeyLoyaltyClient::with_transport(Credentials::new("key", "secret").unwrap(), config, Arc::clone(api)).unwrap()
}

fn form_keys(request: &HttpRequest) -> Vec<&str> {
    request.form.iter().map(|(k, _)| k.as_str()).collect()
}

#[tokio::test]
async fn test_list_schema_is_fetched_once() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let first = client.get_list(LIST_ID).await.unwrap();
    let second = client.get_list(LIST_ID).await.unwrap();

    assert_eq!(first.name, "Webshop");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(api.count(HttpMethod::Get, "/lists/5"), 1);
    assert!(client.cached_list(LIST_ID).await.is_some());
}

#[tokio::test]
async fn test_concurrent_schema_fetches_are_deduplicated() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let (a, b) = tokio::join!(client.get_list(LIST_ID), client.get_list(LIST_ID));
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(api.count(HttpMethod::Get, "/lists/5"), 1);
}

#[tokio::test]
async fn test_requests_are_signed() {
    let api = FakeApi::with_members(0);
    client(&api).get_lists().await.unwrap();

    let request = &api.requests()[0];
    assert!(request.header("authorization").unwrap().starts_with("Basic "));
    assert!(request.header("X-Request-Timestamp").unwrap().ends_with(" GMT"));
}

#[tokio::test]
async fn test_member_page_is_parsed_with_schema() {
    let api = FakeApi::with_members(3);
    let client = client(&api);

    let members = client.get_list_members(LIST_ID, 1, 2, None).await.unwrap();

    assert_eq!(members.len(), 2);
    let member = &members[0];
    assert_eq!(member.id(), Some("member-00000"));
    assert_eq!(member.email(), Some("member0@example.com"));
    assert_eq!(member.get("birthdate"), Some(&FieldValue::Absent));
    assert_eq!(member.get("password"), Some(&FieldValue::Absent));
    assert_eq!(member.choice("sex"), Some(2));
    assert_eq!(member.flag("newsletter"), Some(true));
    assert!(member.is_active());

    let request = api.requests().into_iter().find(|r| r.url.ends_with("/members")).unwrap();
    assert_eq!(request.query_value("page"), Some("1"));
    assert_eq!(request.query_value("perpage"), Some("2"));
    assert_eq!(request.query_value("orderby"), Some("created_at"));
}

#[tokio::test]
async fn test_lookup_by_email() {
    let api = FakeApi::with_members(10);
    let client = client(&api);

    let found = client.get_member_by_email(LIST_ID, "member7@example.com").await.unwrap();
    assert_eq!(found.unwrap().id(), Some("member-00007"));

    let missing = client.get_member_by_email(LIST_ID, "nobody@example.com").await.unwrap();
    assert!(missing.is_none());

    let lookup = api.requests().into_iter().rev().find(|r| r.url.ends_with("/members")).unwrap();
    assert_eq!(lookup.query_value("perpage"), Some("1"));
    assert_eq!(lookup.query_value("filter[email][eq][]"), Some("nobody@example.com"));
}

#[tokio::test]
async fn test_lookup_by_mobile_sends_mobile_filter() {
    let api = FakeApi::with_members(2);
    let client = client(&api);

    client.get_member_by_mobile(LIST_ID, "+4512345678").await.unwrap();

    let lookup = api.requests().into_iter().rev().find(|r| r.url.ends_with("/members")).unwrap();
    assert_eq!(lookup.query_value("filter[mobile][eq][]"), Some("+4512345678"));
}

#[tokio::test]
async fn test_enumerate_visits_every_member_in_order() {
    let api = FakeApi::with_members(2500);
    let client = client(&api);

    let mut visited = Vec::new();
    let total = client
        .enumerate_members(LIST_ID, None, |member| visited.push(member.id().unwrap().to_string()))
        .await
        .unwrap();

    assert_eq!(total, 2500);
    assert_eq!(visited.len(), 2500);
    assert_eq!(visited[0], "member-00000");
    assert_eq!(visited[2499], "member-02499");
    assert!(visited.windows(2).all(|w| w[0] < w[1]));
    // 1000 + 1000 + 500, then the empty page that ends the walk
    assert_eq!(api.count(HttpMethod::Get, "/lists/5/members"), 4);
}

#[tokio::test]
async fn test_enumerate_survives_server_page_cap() {
    let api = FakeApi::with_page_cap(2500, 500);
    let client = client(&api);

    let mut visited = Vec::new();
    let total = client
        .enumerate_members(LIST_ID, None, |member| visited.push(member.id().unwrap().to_string()))
        .await
        .unwrap();

    assert_eq!(total, 2500);
    assert_eq!(visited.len(), 2500);
    assert_eq!(visited[499], "member-00499");
    assert_eq!(visited[500], "member-00500");
    assert_eq!(visited[2499], "member-02499");
    assert_eq!(api.count(HttpMethod::Get, "/lists/5/members"), 6);
}

#[tokio::test]
async fn test_enumerate_stops_on_empty_page() {
    let api = FakeApi::with_members(2000);
    let client = client(&api);

    let mut count = 0;
    client.enumerate_members(LIST_ID, None, |_| count += 1).await.unwrap();

    assert_eq!(count, 2000);
    assert_eq!(api.count(HttpMethod::Get, "/lists/5/members"), 3);
}

#[tokio::test]
async fn test_enumerate_can_be_cancelled_between_pages() {
    let api = FakeApi::with_members(2500);
    let client = client(&api);
    let cancel = CancellationToken::new();

    let mut count = 0;
    let result = client
        .enumerate_members_with_cancel(LIST_ID, None, &cancel, |_| {
            count += 1;
            if count == 1000 {
                cancel.cancel();
            }
        })
        .await;

    assert!(matches!(result, Err(HeyLoyaltyError::Cancelled)));
    assert_eq!(count, 1000);
    assert_eq!(api.count(HttpMethod::Get, "/lists/5/members"), 1);
}

#[tokio::test]
async fn test_load_member() {
    let api = FakeApi::with_members(5);
    let client = client(&api);

    let member = client.load_member(LIST_ID, "member-00003").await.unwrap();
    assert_eq!(member.email(), Some("member3@example.com"));
    assert_eq!(member.list_id(), LIST_ID);

    let err = client.load_member(LIST_ID, "missing").await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_create_member_sends_every_field_and_assigns_id() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let mut member = Member::new(LIST_ID);
    member.set("email", "jane@example.com").set("sex", FieldValue::Choice(2)).set("newsletter", true);

    let id = client.create_member(&mut member).await.unwrap();

    assert_eq!(id, "new-member-guid");
    assert_eq!(member.id(), Some("new-member-guid"));

    let post = api.requests().into_iter().find(|r| r.method == HttpMethod::Post).unwrap();
    assert_eq!(form_keys(&post), ["email", "firstname", "password", "birthdate", "sex", "newsletter"]);
    assert_eq!(post.form[0].1, "jane@example.com");
    assert_eq!(post.form[1].1, "");
    assert_eq!(post.form[4].1, "2");
    assert_eq!(post.form[5].1, "1");
}

#[tokio::test]
async fn test_create_member_with_id_makes_no_request() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let list = List::from_metadata(metadata()).unwrap();
    let mut member = Member::from_record(&list, &member_record(1)).unwrap();

    let err = client.create_member(&mut member).await.unwrap_err();

    assert!(matches!(err, HeyLoyaltyError::MemberAlreadyCreated { ref id } if id == "member-00001"));
    assert!(err.is_precondition());
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_create_member_rejects_unexpected_status() {
    let api = Arc::new(FakeApi {
        members: Vec::new(),
        requests: Mutex::new(Vec::new()),
        write_status: 422,
        page_cap: None,
    });
    let client = client(&api);

    let mut member = Member::new(LIST_ID);
    member.set("email", "jane@example.com");

    let err = client.create_member(&mut member).await.unwrap_err();
    assert!(matches!(err, HeyLoyaltyError::UnexpectedStatus { status: 422, .. }));
    assert_eq!(member.id(), None);
}

#[tokio::test]
async fn test_update_member_sends_only_present_fields() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let list = List::from_metadata(metadata()).unwrap();
    let mut member = Member::from_record(
        &list,
        &json!({"id": "member-42", "email": "old@example.com", "password": "x", "created_at": "2015-03-14"}),
    )
    .unwrap();
    member.set("firstname", "Jane").set("not_in_schema", "ignored");

    client.update_member(&member).await.unwrap();

    let put = api.requests().into_iter().find(|r| r.method == HttpMethod::Put).unwrap();
    assert_eq!(put.url, format!("{BASE}/lists/5/members/member-42"));
    assert_eq!(form_keys(&put), ["email", "firstname"]);
}

#[tokio::test]
async fn test_update_member_without_id_fails() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let err = client.update_member(&Member::new(LIST_ID)).await.unwrap_err();
    assert!(matches!(err, HeyLoyaltyError::MemberNotCreated));

    let err = client.delete_member(&Member::new(LIST_ID)).await.unwrap_err();
    assert!(matches!(err, HeyLoyaltyError::MemberNotCreated));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_update_member_data_sends_every_field() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let mut data = IndexMap::new();
    data.insert("email".to_string(), FieldValue::from("new@example.com"));
    data.insert("birthdate".to_string(), FieldValue::Timestamp(642_902_400));

    client.update_member_data(LIST_ID, "member-42", &data).await.unwrap();

    let put = api.requests().into_iter().find(|r| r.method == HttpMethod::Put).unwrap();
    assert_eq!(form_keys(&put), ["email", "firstname", "password", "birthdate", "sex", "newsletter"]);
    assert_eq!(put.form[0].1, "new@example.com");
    assert_eq!(put.form[3].1, "1990-05-17");
    assert_eq!(put.form[5].1, "0");
}

#[tokio::test]
async fn test_save_member_dispatches_on_id() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let mut member = Member::new(LIST_ID);
    member.set("email", "jane@example.com");

    let id = client.save_member(&mut member).await.unwrap();
    assert_eq!(api.count(HttpMethod::Post, "/lists/5/members"), 1);

    member.set("firstname", "Jane");
    let same = client.save_member(&mut member).await.unwrap();
    assert_eq!(id, same);
    assert_eq!(api.count(HttpMethod::Put, "/lists/5/members/new-member-guid"), 1);
}

#[tokio::test]
async fn test_delete_member() {
    let api = FakeApi::with_members(0);
    let client = client(&api);

    let list = List::from_metadata(metadata()).unwrap();
    let member = Member::from_record(&list, &member_record(9)).unwrap();

    client.delete_member(&member).await.unwrap();
    assert_eq!(api.count(HttpMethod::Delete, "/lists/5/members/member-00009"), 1);
}

#[tokio::test]
async fn test_filtered_enumeration() {
    let api = FakeApi::with_members(50);
    let client = client(&api);

    let mut filter = ListFilter::new();
    filter.equal_to("email", "member12@example.com");

    let mut ids = Vec::new();
    client
        .enumerate_members(LIST_ID, Some(&filter), |m| ids.push(m.id().unwrap().to_string()))
        .await
        .unwrap();

    assert_eq!(ids, ["member-00012"]);
}
