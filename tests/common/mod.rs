#![allow(dead_code)]

//! In-process fake of the SIMIG API for integration tests.
//!
//! Every test spawns its own backend on a free port with fresh seed data.
//! Collections live in memory; stock movements adjust product weight the
//! way the real server does. Every request is recorded with its
//! `Authorization` header. Single paths can be made to fail, or have one
//! response held back until the test releases it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Notify;
use uuid::Uuid;

use simig::app::App;
use simig::config::AppConfig;
use simig::inventory::{Category, CategoryDraft, MovementDraft, Product, ProductDraft, StockMovement};
use simig::session::{Role, SessionStore};
use simig::users::{ManagedUser, ManagedUserDraft};

type Reply = (StatusCode, Json<Value>);
type Shared = Arc<Mutex<Backend>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub image_url: Option<String>,
}

impl Account {
    fn profile(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "full_name": self.full_name,
            "role": self.role,
            "image_url": self.image_url,
        })
    }

    fn managed(&self) -> ManagedUser {
        ManagedUser {
            id: self.id,
            username: self.username.clone(),
            email: Some(self.email.clone()),
            full_name: Some(self.full_name.clone()),
            role: self.role,
        }
    }
}

#[derive(Debug, Default)]
pub struct Backend {
    pub accounts: Vec<Account>,
    pub tokens: HashMap<String, i64>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub stock_in: Vec<StockMovement>,
    pub stock_out: Vec<StockMovement>,
    pub requests: Vec<Recorded>,
    pub fail_writes: bool,
    /// Full paths (`/api/...`) answered with a 500 whatever the method
    pub fail_paths: HashSet<String>,
    /// Next response on each path waits for its gate after the handler ran
    held: HashMap<String, Arc<Notify>>,
    /// Paths whose response is built and waiting on a gate, one per hold
    parked: Vec<String>,
    next_id: i64,
}

impl Backend {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn account_for(&self, headers: &HeaderMap) -> Result<Account, Reply> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let id = token.and_then(|t| self.tokens.get(t)).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Authentication credentials were not provided." })),
            )
        })?;
        self.accounts
            .iter()
            .find(|a| a.id == *id)
            .cloned()
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "User not found" }))))
    }

    fn admin_for(&self, headers: &HeaderMap) -> Result<Account, Reply> {
        let account = self.account_for(headers)?;
        if account.role != Role::Admin {
            return Err(forbidden());
        }
        Ok(account)
    }

    fn product_name(&self, id: i64) -> String {
        self.products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    fn product_mut(&mut self, id: i64) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    fn seed() -> Self {
        let mut b = Backend::default();
        b.accounts = vec![
            Account {
                id: 1,
                username: "admin".into(),
                password: "admin123".into(),
                full_name: "Admin Gudang".into(),
                email: "admin@simig.test".into(),
                role: Role::Admin,
                image_url: None,
            },
            Account {
                id: 2,
                username: "staff".into(),
                password: "staff123".into(),
                full_name: "Staf Gudang".into(),
                email: "staff@simig.test".into(),
                role: Role::User,
                image_url: None,
            },
        ];
        b.categories = vec![
            Category { id: 1, name: "Logam".into() },
            Category { id: 2, name: "Kertas".into() },
            Category { id: 3, name: "Plastik".into() },
        ];

        let products = [
            ("Besi Tua", 1, Decimal::new(12000, 2), 8000),
            ("Kardus", 2, Decimal::new(4000, 2), 2500),
            ("Botol PET", 3, Decimal::new(50, 1), 4500),
            ("Kaleng", 1, Decimal::new(3550, 2), 9000),
            ("Kertas HVS", 2, Decimal::new(1800, 2), 3000),
            ("Plastik Kresek", 3, Decimal::new(900, 2), 1500),
            ("Tembaga", 1, Decimal::new(325, 2), 95000),
            ("Koran Bekas", 2, Decimal::new(6000, 2), 2000),
            ("Aluminium", 1, Decimal::new(1420, 2), 18000),
            ("Plastik HDPE", 3, Decimal::new(2210, 2), 5000),
            ("Duplex", 2, Decimal::new(800, 2), 1200),
            ("Plastik Campur", 3, Decimal::new(4400, 2), 1000),
        ];
        for (i, (name, category, weight, price)) in products.into_iter().enumerate() {
            let category_name = b.categories[(category - 1) as usize].name.clone();
            b.products.push(Product {
                id: i as i64 + 1,
                name: name.into(),
                category,
                category_name,
                color: None,
                weight,
                price_per_kg: Decimal::from(price),
                total_value: None,
                created_at: None,
            });
        }

        b.stock_in = vec![
            movement(1, 1, "Besi Tua", "2025-01-06", Decimal::new(5000, 2)),
            movement(2, 3, "Botol PET", "2025-02-11", Decimal::new(100, 1)),
            movement(3, 2, "Kardus", "2025-02-20", Decimal::new(2500, 2)),
        ];
        b.stock_out = vec![
            movement(4, 3, "Botol PET", "2025-02-14", Decimal::new(50, 1)),
            movement(5, 1, "Besi Tua", "2025-03-02", Decimal::new(1000, 2)),
        ];
        b.next_id = 100;
        b
    }
}

fn movement(id: i64, product: i64, name: &str, date: &str, quantity: Decimal) -> StockMovement {
    StockMovement {
        id,
        product,
        product_name: name.into(),
        date: date.parse::<NaiveDate>().unwrap(),
        quantity,
        notes: None,
        created_at: None,
    }
}

fn forbidden() -> Reply {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "detail": "You do not have permission to perform this action." })),
    )
}

fn not_found() -> Reply {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." })))
}

fn bad_request(field: &str, message: &str) -> Reply {
    (StatusCode::BAD_REQUEST, Json(json!({ field: [message] })))
}

fn ok(value: impl serde::Serialize) -> Reply {
    (StatusCode::OK, Json(serde_json::to_value(value).unwrap()))
}

fn created(value: impl serde::Serialize) -> Reply {
    (StatusCode::CREATED, Json(serde_json::to_value(value).unwrap()))
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, Reply> {
    serde_json::from_value(body).map_err(|e| bad_request("non_field_errors", &e.to_string()))
}

fn lock(state: &Shared) -> MutexGuard<'_, Backend> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

async fn record(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (fail, gate) = {
        let mut backend = lock(&state);
        backend.requests.push(Recorded {
            method: method.to_string(),
            path: path.clone(),
            authorization,
        });
        let write_fails = backend.fail_writes && method != Method::GET && !path.starts_with("/api/users/login");
        (write_fails || backend.fail_paths.contains(&path), backend.held.remove(&path))
    };

    if fail {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Simulated server failure" })),
        )
            .into_response();
    }

    let response = next.run(req).await;
    if let Some(gate) = gate {
        lock(&state).parked.push(path);
        gate.notified().await;
    }
    response
}

// ---- auth -----------------------------------------------------------------

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut b = lock(&state);
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let Some(account) = b
        .accounts
        .iter()
        .find(|a| a.username == username && a.password == password)
        .cloned()
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        );
    };

    let access = Uuid::new_v4().simple().to_string();
    b.tokens.insert(access.clone(), account.id);
    ok(json!({
        "access": access,
        "refresh": Uuid::new_v4().simple().to_string(),
        "role": account.role,
        "username": account.username,
        "email": account.email,
        "id": account.id,
    }))
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut b = lock(&state);
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let full_name = body["full_name"].as_str().unwrap_or_default().to_string();

    if b.accounts.iter().any(|a| a.username == username) {
        return bad_request("username", "A user with that username already exists.");
    }
    if password.len() < 6 {
        return bad_request("password", "This password is too short.");
    }
    if full_name.is_empty() {
        return bad_request("full_name", "This field is required.");
    }

    let id = b.next_id();
    b.accounts.push(Account {
        id,
        username: username.clone(),
        password,
        full_name: full_name.clone(),
        email: String::new(),
        role: Role::User,
        image_url: None,
    });
    created(json!({ "id": id, "username": username, "full_name": full_name }))
}

// ---- profile --------------------------------------------------------------

async fn get_profile(State(state): State<Shared>, headers: HeaderMap) -> Result<Reply, Reply> {
    let b = lock(&state);
    let account = b.account_for(&headers)?;
    Ok(ok(account.profile()))
}

async fn put_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    let account = b.account_for(&headers)?;
    if body.get("role").is_some() {
        return Err((StatusCode::FORBIDDEN, Json(json!({ "detail": "Role cannot be changed." }))));
    }

    let slot = b
        .accounts
        .iter_mut()
        .find(|a| a.id == account.id)
        .ok_or_else(not_found)?;
    if let Some(username) = body["username"].as_str() {
        slot.username = username.to_string();
    }
    if let Some(full_name) = body["full_name"].as_str() {
        slot.full_name = full_name.to_string();
    }
    Ok(ok(slot.profile()))
}

async fn change_password(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    let account = b.account_for(&headers)?;
    let old = body["old_password"].as_str().unwrap_or_default();
    let new = body["new_password"].as_str().unwrap_or_default();
    let confirm = body["confirm_password"].as_str().unwrap_or_default();

    if new != confirm {
        return Err(bad_request("confirm_password", "Passwords do not match."));
    }
    if old != account.password {
        return Err(bad_request("old_password", "Wrong password."));
    }
    if let Some(slot) = b.accounts.iter_mut().find(|a| a.id == account.id) {
        slot.password = new.to_string();
    }
    Ok(ok(json!({ "message": "Password changed." })))
}

async fn upload_image(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Reply, Reply> {
    let account = lock(&state).account_for(&headers)?;

    let mut file_name = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            let name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| bad_request("image", &e.to_string()))?;
            if !bytes.is_empty() {
                file_name = Some(name);
            }
        }
    }
    let file_name = file_name.ok_or_else(|| bad_request("image", "No file was submitted."))?;

    let url = format!("http://testserver/media/profile_pics/{}-{}", account.id, file_name);
    let mut b = lock(&state);
    if let Some(slot) = b.accounts.iter_mut().find(|a| a.id == account.id) {
        slot.image_url = Some(url.clone());
    }
    Ok(ok(json!({ "image_url": url })))
}

// ---- users ----------------------------------------------------------------

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Result<Reply, Reply> {
    let b = lock(&state);
    b.admin_for(&headers)?;
    let users: Vec<ManagedUser> = b.accounts.iter().map(Account::managed).collect();
    Ok(ok(users))
}

async fn create_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    b.admin_for(&headers)?;
    let draft: ManagedUserDraft = decode(body)?;
    if b.accounts.iter().any(|a| a.username == draft.username) {
        return Err(bad_request("username", "A user with that username already exists."));
    }
    let id = b.next_id();
    let account = Account {
        id,
        username: draft.username,
        password: draft.password,
        full_name: draft.full_name,
        email: draft.email,
        role: draft.role,
        image_url: None,
    };
    let reply = account.managed();
    b.accounts.push(account);
    Ok(created(reply))
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    b.admin_for(&headers)?;
    let password = body.get("password").and_then(Value::as_str).map(str::to_string);
    let draft: ManagedUserDraft = decode(body)?;
    let slot = b.accounts.iter_mut().find(|a| a.id == id).ok_or_else(not_found)?;
    slot.username = draft.username;
    slot.full_name = draft.full_name;
    slot.email = draft.email;
    slot.role = draft.role;
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        slot.password = password;
    }
    Ok(ok(slot.managed()))
}

async fn delete_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, Reply> {
    let mut b = lock(&state);
    b.admin_for(&headers)?;
    let before = b.accounts.len();
    b.accounts.retain(|a| a.id != id);
    if b.accounts.len() == before {
        return Err(not_found());
    }
    Ok(no_content())
}

// ---- categories -----------------------------------------------------------

async fn list_categories(State(state): State<Shared>, headers: HeaderMap) -> Result<Reply, Reply> {
    let b = lock(&state);
    b.account_for(&headers)?;
    Ok(ok(&b.categories))
}

async fn create_category(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    b.account_for(&headers)?;
    let draft: CategoryDraft = decode(body)?;
    if draft.name.is_empty() {
        return Err(bad_request("name", "This field may not be blank."));
    }
    let category = Category { id: b.next_id(), name: draft.name };
    b.categories.push(category.clone());
    Ok(created(category))
}

async fn update_category(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    b.account_for(&headers)?;
    let draft: CategoryDraft = decode(body)?;
    let slot = b.categories.iter_mut().find(|c| c.id == id).ok_or_else(not_found)?;
    slot.name = draft.name.clone();
    let reply = slot.clone();
    for product in b.products.iter_mut().filter(|p| p.category == id) {
        product.category_name = draft.name.clone();
    }
    Ok(ok(reply))
}

async fn delete_category(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, Reply> {
    let mut b = lock(&state);
    b.account_for(&headers)?;
    let before = b.categories.len();
    b.categories.retain(|c| c.id != id);
    if b.categories.len() == before {
        return Err(not_found());
    }
    b.products.retain(|p| p.category != id);
    Ok(no_content())
}

// ---- products -------------------------------------------------------------

fn build_product(b: &Backend, id: i64, draft: ProductDraft) -> Result<Product, Reply> {
    let category = draft.category.ok_or_else(|| bad_request("category", "This field is required."))?;
    let category_name = b
        .categories
        .iter()
        .find(|c| c.id == category)
        .map(|c| c.name.clone())
        .ok_or_else(|| bad_request("category", "Invalid pk - object does not exist."))?;
    let price_per_kg = draft
        .price_per_kg
        .ok_or_else(|| bad_request("price_per_kg", "This field is required."))?;
    let weight = draft.weight.unwrap_or_default();
    Ok(Product {
        id,
        name: draft.name,
        category,
        category_name,
        color: Some(draft.color).filter(|c| !c.is_empty()),
        weight,
        price_per_kg,
        total_value: Some(weight * price_per_kg),
        created_at: None,
    })
}

async fn list_products(State(state): State<Shared>, headers: HeaderMap) -> Result<Reply, Reply> {
    let b = lock(&state);
    b.account_for(&headers)?;
    Ok(ok(&b.products))
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    b.account_for(&headers)?;
    let draft: ProductDraft = decode(body)?;
    let id = b.next_id();
    let product = build_product(&b, id, draft)?;
    b.products.push(product.clone());
    Ok(created(product))
}

async fn update_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    let mut b = lock(&state);
    b.account_for(&headers)?;
    let draft: ProductDraft = decode(body)?;
    let product = build_product(&b, id, draft)?;
    let slot = b.product_mut(id).ok_or_else(not_found)?;
    *slot = product.clone();
    Ok(ok(product))
}

async fn delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, Reply> {
    let mut b = lock(&state);
    b.account_for(&headers)?;
    let before = b.products.len();
    b.products.retain(|p| p.id != id);
    if b.products.len() == before {
        return Err(not_found());
    }
    Ok(no_content())
}

// ---- stock movements ------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    In,
    Out,
}

impl Direction {
    fn ledger<'a>(&self, b: &'a mut Backend) -> &'a mut Vec<StockMovement> {
        match self {
            Direction::In => &mut b.stock_in,
            Direction::Out => &mut b.stock_out,
        }
    }

    /// Signed effect of `quantity` on product weight.
    fn effect(&self, quantity: Decimal) -> Decimal {
        match self {
            Direction::In => quantity,
            Direction::Out => -quantity,
        }
    }
}

fn apply(b: &mut Backend, direction: Direction, product: i64, quantity: Decimal) -> Result<(), Reply> {
    let slot = b
        .product_mut(product)
        .ok_or_else(|| bad_request("product", "Invalid pk - object does not exist."))?;
    let next = slot.weight + direction.effect(quantity);
    if next < Decimal::ZERO {
        return Err(bad_request("quantity", "Not enough stock."));
    }
    slot.weight = next;
    slot.total_value = Some(slot.weight * slot.price_per_kg);
    Ok(())
}

fn movement_fields(draft: MovementDraft) -> Result<(i64, NaiveDate, Decimal, Option<String>), Reply> {
    let product = draft.product.ok_or_else(|| bad_request("product", "This field is required."))?;
    let date = draft.date.ok_or_else(|| bad_request("date", "This field is required."))?;
    let quantity = draft.quantity.ok_or_else(|| bad_request("quantity", "This field is required."))?;
    let notes = Some(draft.notes).filter(|n| !n.is_empty());
    Ok((product, date, quantity, notes))
}

fn list_movements(state: &Shared, headers: &HeaderMap, direction: Direction) -> Result<Reply, Reply> {
    let mut b = lock(state);
    b.account_for(headers)?;
    Ok(ok(direction.ledger(&mut b).clone()))
}

fn create_movement(state: &Shared, headers: &HeaderMap, direction: Direction, body: Value) -> Result<Reply, Reply> {
    let mut b = lock(state);
    b.account_for(headers)?;
    let (product, date, quantity, notes) = movement_fields(decode(body)?)?;
    apply(&mut b, direction, product, quantity)?;

    let row = StockMovement {
        id: b.next_id(),
        product,
        product_name: b.product_name(product),
        date,
        quantity,
        notes,
        created_at: None,
    };
    direction.ledger(&mut b).push(row.clone());
    Ok(created(row))
}

fn update_movement(
    state: &Shared,
    headers: &HeaderMap,
    direction: Direction,
    id: i64,
    body: Value,
) -> Result<Reply, Reply> {
    let mut b = lock(state);
    b.account_for(headers)?;
    let (product, date, quantity, notes) = movement_fields(decode(body)?)?;
    let old = direction
        .ledger(&mut b)
        .iter()
        .find(|m| m.id == id)
        .cloned()
        .ok_or_else(not_found)?;

    // Undo the old effect, then apply the new one
    apply(&mut b, direction, old.product, -old.quantity)?;
    if let Err(e) = apply(&mut b, direction, product, quantity) {
        apply(&mut b, direction, old.product, old.quantity)?;
        return Err(e);
    }

    let product_name = b.product_name(product);
    let slot = direction
        .ledger(&mut b)
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(not_found)?;
    slot.product = product;
    slot.product_name = product_name;
    slot.date = date;
    slot.quantity = quantity;
    slot.notes = notes;
    Ok(ok(slot.clone()))
}

fn delete_movement(state: &Shared, headers: &HeaderMap, direction: Direction, id: i64) -> Result<Response, Reply> {
    let mut b = lock(state);
    b.account_for(headers)?;
    let old = direction
        .ledger(&mut b)
        .iter()
        .find(|m| m.id == id)
        .cloned()
        .ok_or_else(not_found)?;
    apply(&mut b, direction, old.product, -old.quantity)?;
    direction.ledger(&mut b).retain(|m| m.id != id);
    Ok(no_content())
}

async fn list_in(State(s): State<Shared>, headers: HeaderMap) -> Result<Reply, Reply> {
    list_movements(&s, &headers, Direction::In)
}

async fn create_in(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Result<Reply, Reply> {
    create_movement(&s, &headers, Direction::In, body)
}

async fn update_in(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    update_movement(&s, &headers, Direction::In, id, body)
}

async fn delete_in(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Result<Response, Reply> {
    delete_movement(&s, &headers, Direction::In, id)
}

async fn list_out(State(s): State<Shared>, headers: HeaderMap) -> Result<Reply, Reply> {
    list_movements(&s, &headers, Direction::Out)
}

async fn create_out(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Result<Reply, Reply> {
    create_movement(&s, &headers, Direction::Out, body)
}

async fn update_out(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Reply, Reply> {
    update_movement(&s, &headers, Direction::Out, id, body)
}

async fn delete_out(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Result<Response, Reply> {
    delete_movement(&s, &headers, Direction::Out, id)
}

// ---- statistics -----------------------------------------------------------

async fn dashboard(State(state): State<Shared>, headers: HeaderMap) -> Result<Reply, Reply> {
    let b = lock(&state);
    b.account_for(&headers)?;

    let total_asset: Decimal = b.products.iter().map(|p| p.weight * p.price_per_kg).sum();
    let total_stock: Decimal = b.products.iter().map(|p| p.weight).sum();
    let lowest = b
        .products
        .iter()
        .min_by_key(|p| p.weight)
        .map(|p| json!({ "name": p.name, "stock": p.weight }))
        .unwrap_or_else(|| json!({ "name": "-", "stock": 0 }));

    Ok(ok(json!({
        "total_asset": total_asset,
        "total_stock": total_stock,
        "lowest_stock_item": lowest,
        "income_month": 0,
        "recent_in": b.stock_in.iter().rev().take(5).collect::<Vec<_>>(),
        "recent_out": b.stock_out.iter().rev().take(5).collect::<Vec<_>>(),
    })))
}

async fn reports(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Reply, Reply> {
    let b = lock(&state);
    b.account_for(&headers)?;
    let period = query.get("period").cloned().unwrap_or_else(|| "monthly".to_string());
    if !["weekly", "monthly", "yearly"].contains(&period.as_str()) {
        return Err(bad_request("period", "Unknown period."));
    }

    let total_in: Decimal = b.stock_in.iter().map(|m| m.quantity).sum();
    let total_out: Decimal = b.stock_out.iter().map(|m| m.quantity).sum();
    let by_product = |rows: &[StockMovement]| {
        let mut labels: Vec<String> = Vec::new();
        let mut data: Vec<Decimal> = Vec::new();
        for row in rows {
            match labels.iter().position(|l| *l == row.product_name) {
                Some(i) => data[i] += row.quantity,
                None => {
                    labels.push(row.product_name.clone());
                    data.push(row.quantity);
                }
            }
        }
        json!({ "labels": labels, "data": data })
    };

    Ok(ok(json!({
        "pie_chart": by_product(&b.stock_out[..]),
        "bar_chart": { "labels": ["W1", "W2", "W3", "W4"], "data": [0, total_out, 0, 0] },
        "pie_chart_in": by_product(&b.stock_in[..]),
        "bar_chart_in": { "labels": ["W1", "W2", "W3", "W4"], "data": [total_in, 0, 0, 0] },
        "summary": {
            "total_in": total_in,
            "total_out": total_out,
            "revenue": 0,
            "asset_change": 0,
            "date_info": period,
        }
    })))
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/users/login/", post(login))
        .route("/users/register/", post(register))
        .route("/users/profile/", get(get_profile).put(put_profile))
        .route("/users/profile/change-password/", put(change_password))
        .route("/users/profile/upload-image/", put(upload_image))
        .route("/users/manage/", get(list_users).post(create_user))
        .route("/users/manage/:id/", put(update_user).delete(delete_user))
        .route("/categories/", get(list_categories).post(create_category))
        .route("/categories/:id/", put(update_category).delete(delete_category))
        .route("/products/", get(list_products).post(create_product))
        .route("/products/:id/", put(update_product).delete(delete_product))
        .route("/transactions-in/", get(list_in).post(create_in))
        .route("/transactions-in/:id/", put(update_in).delete(delete_in))
        .route("/transactions-out/", get(list_out).post(create_out))
        .route("/transactions-out/:id/", put(update_out).delete(delete_out))
        .route("/dashboard/", get(dashboard))
        .route("/reports/", get(reports));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

pub struct FakeBackend {
    pub port: u16,
    /// Base URL including the `/api` prefix
    pub base_url: String,
    state: Shared,
}

impl FakeBackend {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind fake backend")?;

        let state: Shared = Arc::new(Mutex::new(Backend::seed()));
        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}/api", port),
            state,
        })
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::defaults().with_base_url(self.base_url.clone())
    }

    /// Fresh application context with an in-memory session.
    pub fn app(&self) -> Result<App> {
        Ok(App::new(self.config(), Arc::new(SessionStore::in_memory()))?)
    }

    /// Context already signed in as one of the seeded accounts.
    pub async fn app_as(&self, username: &str) -> Result<App> {
        let app = self.app()?;
        let password = format!("{}123", username);
        app.auth().login(username, &password).await?;
        Ok(app)
    }

    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        lock(&self.state)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.backend().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.backend().requests.clear();
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.backend().fail_writes = fail;
    }

    pub fn set_fail_path(&self, path: &str, fail: bool) {
        let mut backend = self.backend();
        if fail {
            backend.fail_paths.insert(path.to_string());
        } else {
            backend.fail_paths.remove(path);
        }
    }

    /// Hold back the next response on `path`. The handler still runs at
    /// once, so the held response carries the data as it was then.
    /// `notify_one` on the returned gate lets it go.
    pub fn hold_next(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.backend().held.insert(path.to_string(), Arc::clone(&gate));
        gate
    }

    /// Wait until `count` responses on `path` are built and held.
    pub async fn wait_until_parked(&self, path: &str, count: usize) -> Result<()> {
        let parked = || self.backend().parked.iter().filter(|p| p.as_str() == path).count();
        tokio::time::timeout(Duration::from_secs(5), async {
            while parked() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .with_context(|| format!("no held response on {}", path))
    }

    pub fn product_weight(&self, id: i64) -> Option<Decimal> {
        self.backend().products.iter().find(|p| p.id == id).map(|p| p.weight)
    }
}
