use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Years `/api/export/data` has rows for.
pub const EXPORT_YEARS: &[i32] = &[2023, 2024];

#[derive(Serialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(Envelope {
        code: 0,
        message: Some("success".to_string()),
        data: Some(data),
    })
    .into_response()
}

fn fail(code: i64, message: &str) -> Response {
    Json(Envelope::<()> {
        code,
        message: Some(message.to_string()),
        data: None,
    })
    .into_response()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: i64,
    pub name: String,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<u32>,
    pub release_date: Option<String>,
    pub poster: Option<String>,
    pub description: Option<String>,
    pub likes: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmInput {
    pub name: String,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<u32>,
    pub release_date: Option<String>,
    pub poster: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub id: i64,
    pub is_star_clicked: bool,
}

#[derive(Clone, Copy, Deserialize)]
pub struct LikeKey {
    pub uid: i64,
    pub mid: i64,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub user_pic: Option<String>,
    pub role: Option<String>,
    #[serde(skip)]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub old_pwd: String,
    pub new_pwd: String,
    pub re_pwd: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub keyword: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub items: Vec<T>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screening {
    pub id: i64,
    pub movie_id: i64,
    pub hall: String,
    pub start_time: String,
    pub price: f64,
    pub seats_available: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningInput {
    pub movie_id: i64,
    pub hall: String,
    pub start_time: String,
    pub price: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFilter {
    pub movie_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub content: String,
    pub rating: Option<u8>,
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    pub movie_id: i64,
    pub user_id: i64,
    pub content: String,
    pub rating: Option<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub screening_id: i64,
    pub seats: Vec<String>,
    pub amount: f64,
    pub status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub user_id: i64,
    pub screening_id: i64,
    pub seats: Vec<String>,
}

#[derive(Deserialize)]
pub struct ExportParams {
    pub year: Option<i32>,
}

#[derive(Default)]
pub struct Db {
    pub films: BTreeMap<i64, Film>,
    pub users: Vec<User>,
    pub likes: HashSet<(i64, i64)>,
    pub screenings: BTreeMap<i64, Screening>,
    pub comments: Vec<Comment>,
    pub orders: BTreeMap<i64, Order>,
    /// Issued token -> user id.
    pub sessions: BTreeMap<String, i64>,
    next_id: i64,
}

impl Db {
    pub fn seeded() -> Self {
        let mut db = Db {
            next_id: 100,
            ..Db::default()
        };
        for (id, name, genre, likes) in [
            (1, "Arrival", "sci-fi", 42),
            (2, "Heat", "crime", 17),
            (3, "Spirited Away", "animation", 64),
            (4, "Paddington 2", "family", 8),
        ] {
            db.films.insert(
                id,
                Film {
                    id,
                    name: name.to_string(),
                    director: None,
                    genre: Some(genre.to_string()),
                    duration: None,
                    release_date: None,
                    poster: Some(format!("/image/poster-{id}.png")),
                    description: None,
                    likes,
                },
            );
        }
        db.users = vec![
            User {
                id: 1,
                username: "alice".to_string(),
                nickname: Some("Alice".to_string()),
                email: Some("alice@example.com".to_string()),
                user_pic: None,
                role: Some("admin".to_string()),
                password: "secret".to_string(),
            },
            User {
                id: 2,
                username: "bob".to_string(),
                nickname: None,
                email: None,
                user_pic: None,
                role: Some("user".to_string()),
                password: "hunter2".to_string(),
            },
        ];
        db.screenings.insert(
            1,
            Screening {
                id: 1,
                movie_id: 1,
                hall: "Hall 1".to_string(),
                start_time: "2024-06-01T19:30:00".to_string(),
                price: 45.0,
                seats_available: 120,
            },
        );
        db
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<&User> {
        let token = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let id = self.sessions.get(token)?;
        self.users.iter().find(|u| u.id == *id)
    }
}

pub type SharedDb = Arc<RwLock<Db>>;

pub fn app() -> Router {
    let db: SharedDb = Arc::new(RwLock::new(Db::seeded()));
    Router::new()
        .route("/api/homepage/filmList", get(list_films))
        .route("/api/homepage/hotList", get(hot_films))
        .route("/api/homepage/updateLikes", patch(update_likes))
        .route("/api/likes/addLike", post(add_like))
        .route("/api/likes/deleteLike", delete(delete_like))
        .route("/api/likes/getLike", get(get_like))
        .route("/api/user/login", post(login))
        .route("/api/auth/getInfo", get(user_info))
        .route("/api/user/list", get(list_users))
        .route("/api/user/resetPassword", put(reset_password))
        .route("/api/movies", post(add_movie))
        .route("/api/movies/{id}", put(update_movie).delete(delete_movie))
        .route("/api/upload", post(upload))
        .route("/api/screenings", get(list_screenings).post(add_screening))
        .route("/api/screenings/{id}", delete(delete_screening))
        .route("/api/comments", get(list_comments).post(add_comment))
        .route("/api/orders", get(list_orders).post(place_order))
        .route("/api/orders/{id}/cancel", put(cancel_order))
        .route("/api/export/data", get(export_data))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock ticketing server listening");
    }
    axum::serve(listener, app()).await
}

async fn list_films(State(db): State<SharedDb>) -> Response {
    let db = db.read().await;
    ok(db.films.values().cloned().collect::<Vec<_>>())
}

async fn hot_films(State(db): State<SharedDb>) -> Response {
    let db = db.read().await;
    let mut films: Vec<Film> = db.films.values().cloned().collect();
    films.sort_by(|a, b| b.likes.cmp(&a.likes));
    films.truncate(3);
    ok(films)
}

async fn update_likes(State(db): State<SharedDb>, Json(input): Json<LikeToggle>) -> Response {
    let mut db = db.write().await;
    let Some(film) = db.films.get_mut(&input.id) else {
        return fail(1, "film not found");
    };
    film.likes += if input.is_star_clicked { 1 } else { -1 };
    film.likes = film.likes.max(0);
    ok(())
}

async fn add_like(State(db): State<SharedDb>, Json(key): Json<LikeKey>) -> Response {
    let mut db = db.write().await;
    if !db.films.contains_key(&key.mid) {
        return fail(1, "film not found");
    }
    db.likes.insert((key.uid, key.mid));
    ok(())
}

async fn delete_like(State(db): State<SharedDb>, Query(key): Query<LikeKey>) -> Response {
    db.write().await.likes.remove(&(key.uid, key.mid));
    ok(())
}

async fn get_like(State(db): State<SharedDb>, Query(key): Query<LikeKey>) -> Response {
    ok(db.read().await.likes.contains(&(key.uid, key.mid)))
}

async fn login(State(db): State<SharedDb>, Json(input): Json<Credentials>) -> Response {
    let mut db = db.write().await;
    let Some(id) = db
        .users
        .iter()
        .find(|u| u.username == input.username && u.password == input.password)
        .map(|u| u.id)
    else {
        debug!(username = %input.username, "login rejected");
        return fail(1, "invalid username or password");
    };
    let token = Uuid::new_v4().to_string();
    db.sessions.insert(token.clone(), id);
    ok(token)
}

async fn user_info(State(db): State<SharedDb>, headers: HeaderMap) -> Response {
    let db = db.read().await;
    match db.user_for(&headers) {
        Some(user) => ok(user.clone()),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn list_users(State(db): State<SharedDb>, Query(params): Query<ListParams>) -> Response {
    let db = db.read().await;
    let matching: Vec<User> = db
        .users
        .iter()
        .filter(|u| {
            params
                .keyword
                .as_deref()
                .map_or(true, |k| u.username.contains(k))
        })
        .cloned()
        .collect();
    ok(paginate(matching, &params))
}

async fn reset_password(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<PasswordReset>,
) -> Response {
    let mut db = db.write().await;
    let Some(id) = db.user_for(&headers).map(|u| u.id) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if input.new_pwd != input.re_pwd {
        return fail(1, "passwords do not match");
    }
    let Some(user) = db.users.iter_mut().find(|u| u.id == id) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if user.password != input.old_pwd {
        return fail(1, "old password is incorrect");
    }
    user.password = input.new_pwd;
    ok(())
}

async fn add_movie(State(db): State<SharedDb>, Json(input): Json<FilmInput>) -> Response {
    let mut db = db.write().await;
    let id = db.next_id();
    let film = film_from(id, 0, input);
    db.films.insert(id, film.clone());
    ok(film)
}

async fn update_movie(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
    Json(input): Json<FilmInput>,
) -> Response {
    let mut db = db.write().await;
    let Some(existing) = db.films.get(&id) else {
        return fail(1, "film not found");
    };
    let film = film_from(id, existing.likes, input);
    db.films.insert(id, film.clone());
    ok(film)
}

async fn delete_movie(State(db): State<SharedDb>, Path(id): Path<i64>) -> Response {
    match db.write().await.films.remove(&id) {
        Some(_) => ok(()),
        None => fail(1, "film not found"),
    }
}

async fn upload(headers: HeaderMap, body: Bytes) -> Response {
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    if !is_multipart || body.is_empty() {
        return fail(1, "expected a multipart upload");
    }
    ok(format!("/image/{}.png", Uuid::new_v4()))
}

async fn list_screenings(
    State(db): State<SharedDb>,
    Query(filter): Query<MovieFilter>,
) -> Response {
    let db = db.read().await;
    let screenings: Vec<Screening> = db
        .screenings
        .values()
        .filter(|s| s.movie_id == filter.movie_id)
        .cloned()
        .collect();
    ok(screenings)
}

async fn add_screening(State(db): State<SharedDb>, Json(input): Json<ScreeningInput>) -> Response {
    let mut db = db.write().await;
    if !db.films.contains_key(&input.movie_id) {
        return fail(1, "film not found");
    }
    let id = db.next_id();
    let screening = Screening {
        id,
        movie_id: input.movie_id,
        hall: input.hall,
        start_time: input.start_time,
        price: input.price,
        seats_available: 120,
    };
    db.screenings.insert(id, screening.clone());
    ok(screening)
}

async fn delete_screening(State(db): State<SharedDb>, Path(id): Path<i64>) -> Response {
    match db.write().await.screenings.remove(&id) {
        Some(_) => ok(()),
        None => fail(1, "screening not found"),
    }
}

async fn list_comments(State(db): State<SharedDb>, Query(filter): Query<MovieFilter>) -> Response {
    let db = db.read().await;
    let comments: Vec<Comment> = db
        .comments
        .iter()
        .filter(|c| c.movie_id == filter.movie_id)
        .cloned()
        .collect();
    ok(comments)
}

async fn add_comment(State(db): State<SharedDb>, Json(input): Json<CommentInput>) -> Response {
    if input.content.trim().is_empty() {
        return fail(1, "comment is empty");
    }
    let mut db = db.write().await;
    let id = db.next_id();
    let comment = Comment {
        id,
        movie_id: input.movie_id,
        user_id: input.user_id,
        content: input.content,
        rating: input.rating,
        created_at: None,
    };
    db.comments.push(comment.clone());
    ok(comment)
}

async fn list_orders(State(db): State<SharedDb>, Query(params): Query<ListParams>) -> Response {
    let db = db.read().await;
    let orders: Vec<Order> = db
        .orders
        .values()
        .filter(|o| params.status.as_deref().map_or(true, |s| o.status == s))
        .cloned()
        .collect();
    ok(paginate(orders, &params))
}

async fn place_order(State(db): State<SharedDb>, Json(input): Json<OrderInput>) -> Response {
    let mut db = db.write().await;
    let Some(price) = db.screenings.get(&input.screening_id).map(|s| s.price) else {
        return fail(1, "screening not found");
    };
    if input.seats.is_empty() {
        return fail(1, "no seats selected");
    }
    let id = db.next_id();
    let order = Order {
        id,
        user_id: input.user_id,
        screening_id: input.screening_id,
        amount: price * input.seats.len() as f64,
        seats: input.seats,
        status: "pending".to_string(),
    };
    db.orders.insert(id, order.clone());
    ok(order)
}

async fn cancel_order(State(db): State<SharedDb>, Path(id): Path<i64>) -> Response {
    let mut db = db.write().await;
    let Some(order) = db.orders.get_mut(&id) else {
        return fail(1, "order not found");
    };
    order.status = "cancelled".to_string();
    ok(order.clone())
}

async fn export_data(Query(params): Query<ExportParams>) -> Response {
    let Some(year) = params.year else {
        return (StatusCode::BAD_REQUEST, "year is required").into_response();
    };
    if !EXPORT_YEARS.contains(&year) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "message": "no data for year" })),
        )
            .into_response();
    }
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"films-{year}.csv\""),
            ),
        ],
        export_csv(year),
    )
        .into_response()
}

/// The CSV body `/api/export/data` serves for `year`.
pub fn export_csv(year: i32) -> Vec<u8> {
    let mut csv = String::from("year,film,tickets\n");
    for (film, tickets) in [("Arrival", 1200), ("Heat", 860), ("Spirited Away", 2310)] {
        csv.push_str(&format!("{year},{film},{tickets}\n"));
    }
    csv.into_bytes()
}

fn film_from(id: i64, likes: i64, input: FilmInput) -> Film {
    Film {
        id,
        name: input.name,
        director: input.director,
        genre: input.genre,
        duration: input.duration,
        release_date: input.release_date,
        poster: input.poster,
        description: input.description,
        likes,
    }
}

fn paginate<T>(items: Vec<T>, params: &ListParams) -> Page<T> {
    let page = params.page.unwrap_or(1).max(1) as usize;
    let size = params.page_size.unwrap_or(10).max(1) as usize;
    let total = items.len() as u64;
    let items = items.into_iter().skip((page - 1) * size).take(size).collect();
    Page { total, items }
}
