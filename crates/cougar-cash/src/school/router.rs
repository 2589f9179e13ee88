use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::admins::AdminDraft;
use super::awards::AdjustmentMode;
use super::catalog::StoreItemDraft;
use super::domain::HallPassKind;
use super::groups::GroupDraft;
use super::service::{CalendarDay, SchoolService, SchoolServiceError};
use super::snapshot::SnapshotStore;
use super::state::SchoolError;
use crate::rewards::calendar::DayEdit;
use crate::rewards::currency::Amount;
use crate::rewards::redemption::PurchaseId;
use crate::rewards::ActionResult;

type Shared<S> = State<Arc<SchoolService<S>>>;

/// Router builder exposing the school operations under `/api/v1`.
pub fn school_router<S>(service: Arc<SchoolService<S>>) -> Router
where
    S: SnapshotStore + 'static,
{
    Router::new()
        .route("/api/v1/scan", post(scan_handler::<S>))
        .route("/api/v1/calendar", put(edit_calendar_handler::<S>))
        .route("/api/v1/calendar/:date", get(day_points_handler::<S>))
        .route("/api/v1/calendar/:start/:end", get(calendar_range_handler::<S>))
        .route("/api/v1/admins/:admin_id/budget", get(budget_handler::<S>))
        .route("/api/v1/awards", post(award_handler::<S>))
        .route("/api/v1/adjustments", post(adjust_handler::<S>))
        .route("/api/v1/adjustments/bulk", post(bulk_adjust_handler::<S>))
        .route("/api/v1/point-checkout", post(point_checkout_handler::<S>))
        .route("/api/v1/events", post(open_event_handler::<S>))
        .route(
            "/api/v1/events/:event_id/check-ins",
            post(event_check_in_handler::<S>),
        )
        .route("/api/v1/attendance", post(attendance_handler::<S>))
        .route("/api/v1/login/student", post(login_student_handler::<S>))
        .route("/api/v1/login/admin", post(login_admin_handler::<S>))
        .route("/api/v1/roster", post(add_student_handler::<S>))
        .route("/api/v1/roster/import", post(import_roster_handler::<S>))
        .route("/api/v1/roster/delete", post(delete_students_handler::<S>))
        .route("/api/v1/roster/deleted", get(deleted_students_handler::<S>))
        .route(
            "/api/v1/roster/deleted/:student_id/restore",
            post(restore_student_handler::<S>),
        )
        .route(
            "/api/v1/groups",
            get(groups_handler::<S>).post(create_group_handler::<S>),
        )
        .route("/api/v1/groups/:group_id", put(update_group_handler::<S>))
        .route(
            "/api/v1/admins/:admin_id/groups/:group_id",
            delete(delete_group_handler::<S>),
        )
        .route(
            "/api/v1/store-items",
            get(store_items_handler::<S>).post(create_item_handler::<S>),
        )
        .route("/api/v1/store-items/:item_id", put(update_item_handler::<S>))
        .route(
            "/api/v1/admins/:admin_id/store-items/:item_id",
            delete(delete_item_handler::<S>),
        )
        .route("/api/v1/admins", post(create_admin_handler::<S>))
        .route("/api/v1/admins/:admin_id", put(update_admin_handler::<S>))
        .route(
            "/api/v1/admins/:admin_id/admins/:target_id",
            delete(delete_admin_handler::<S>),
        )
        .route("/api/v1/students/:student_id", get(student_handler::<S>))
        .route(
            "/api/v1/students/:student_id/favorites/:item_id",
            post(toggle_favorite_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/cart",
            post(add_to_cart_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/cart/:item_id",
            delete(remove_from_cart_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/purchases",
            post(purchase_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/notifications",
            get(notifications_handler::<S>),
        )
        .route(
            "/api/v1/students/:student_id/notifications/read",
            post(mark_read_handler::<S>),
        )
        .route("/api/v1/orders/pending", get(pending_orders_handler::<S>))
        .route("/api/v1/orders/ready", post(order_ready_handler::<S>))
        .route(
            "/api/v1/hall-passes",
            get(active_passes_handler::<S>).post(request_pass_handler::<S>),
        )
        .route(
            "/api/v1/hall-passes/:pass_id/return",
            post(return_pass_handler::<S>),
        )
        .route("/api/v1/lockouts", post(add_lockout_handler::<S>))
        .route(
            "/api/v1/admins/:admin_id/lockouts/:lockout_id",
            delete(remove_lockout_handler::<S>),
        )
        .route("/api/v1/conflicts", post(add_conflict_handler::<S>))
        .route(
            "/api/v1/admins/:admin_id/conflicts/:conflict_id",
            delete(remove_conflict_handler::<S>),
        )
        .route(
            "/api/v1/polls",
            get(active_polls_handler::<S>).post(create_poll_handler::<S>),
        )
        .route("/api/v1/polls/:poll_id/votes", post(vote_handler::<S>))
        .route(
            "/api/v1/admins/:admin_id/polls/:poll_id",
            delete(delete_poll_handler::<S>),
        )
        .route(
            "/api/v1/announcements",
            get(active_announcements_handler::<S>).post(post_announcement_handler::<S>),
        )
        .route(
            "/api/v1/admins/:admin_id/announcements/:announcement_id",
            delete(delete_announcement_handler::<S>),
        )
        .with_state(service)
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn status_for(error: &SchoolServiceError) -> StatusCode {
    match error {
        SchoolServiceError::School(err) if err.is_not_found() => StatusCode::NOT_FOUND,
        SchoolServiceError::School(SchoolError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
        SchoolServiceError::School(
            SchoolError::InvalidAccessCode | SchoolError::InvalidAdminCode,
        ) => StatusCode::UNAUTHORIZED,
        SchoolServiceError::School(SchoolError::CalendarRangeTooLong { .. }) => {
            StatusCode::BAD_REQUEST
        }
        SchoolServiceError::School(
            SchoolError::DuplicateEmail
            | SchoolError::AlreadyCheckedIn { .. }
            | SchoolError::AlreadyVoted
            | SchoolError::PassAlreadyReturned
            | SchoolError::NotAwaitingPickup
            | SchoolError::DuplicateLoginCode
            | SchoolError::CannotDeleteSelf
            | SchoolError::LastAdminManager,
        ) => StatusCode::CONFLICT,
        SchoolServiceError::School(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchoolServiceError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(error: SchoolServiceError) -> Response {
    let status = status_for(&error);
    let payload = json!({
        "success": false,
        "message": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, SchoolServiceError>) -> Response {
    match result {
        Ok(value) => (status, axum::Json(value)).into_response(),
        Err(error) => failure(error),
    }
}

fn acknowledge(result: Result<String, SchoolServiceError>) -> Response {
    respond(StatusCode::OK, result.map(ActionResult::ok))
}

fn invalid_request(message: impl Into<String>) -> Response {
    let payload = json!({
        "success": false,
        "message": message.into(),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanRequest {
    pub code: String,
}

pub(crate) async fn scan_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<ScanRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.scan(&request.code, now()))
}

pub(crate) async fn day_points_handler<S>(
    State(service): Shared<S>,
    Path(date): Path<NaiveDate>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let day = CalendarDay {
        date,
        points: service.day_points(date),
    };
    (StatusCode::OK, axum::Json(day)).into_response()
}

pub(crate) async fn calendar_range_handler<S>(
    State(service): Shared<S>,
    Path((start, end)): Path<(NaiveDate, NaiveDate)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.calendar_range(start, end))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarEditRequest {
    pub admin_id: String,
    pub dates: Vec<NaiveDate>,
    pub edit: DayEdit,
}

pub(crate) async fn edit_calendar_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<CalendarEditRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service.edit_calendar(&request.admin_id, &request.dates, &request.edit),
    )
}

pub(crate) async fn budget_handler<S>(
    State(service): Shared<S>,
    Path(admin_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.budget(&admin_id, now()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsRequest {
    pub admin_id: String,
    pub student_id: String,
    #[serde(flatten)]
    pub amount: Amount,
    #[serde(default)]
    pub reason: Option<String>,
}

pub(crate) async fn award_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<PointsRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(service.award(
        &request.admin_id,
        &request.student_id,
        request.amount.points(),
        request.reason.as_deref(),
        now(),
    ))
}

pub(crate) async fn point_checkout_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<PointsRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(service.point_checkout(
        &request.admin_id,
        &request.student_id,
        request.amount.points(),
        request.reason.as_deref(),
        now(),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdjustRequest {
    pub admin_id: String,
    pub student_id: String,
    pub mode: AdjustmentMode,
    #[serde(flatten)]
    pub amount: Amount,
    #[serde(default)]
    pub reason: String,
}

pub(crate) async fn adjust_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<AdjustRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(service.adjust(
        &request.admin_id,
        &request.student_id,
        request.mode,
        request.amount.points(),
        &request.reason,
        now(),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkAdjustRequest {
    pub admin_id: String,
    pub student_ids: Vec<String>,
    #[serde(flatten)]
    pub amount: Amount,
    #[serde(default)]
    pub reason: Option<String>,
}

pub(crate) async fn bulk_adjust_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<BulkAdjustRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(service.bulk_adjust(
        &request.admin_id,
        &request.student_ids,
        request.amount.points(),
        request.reason.as_deref(),
        now(),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenEventRequest {
    pub admin_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub reward_points: i64,
}

pub(crate) async fn open_event_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<OpenEventRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.open_event(
            &request.admin_id,
            request.name.as_deref(),
            request.reward_points,
        ),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentRef {
    pub student_id: String,
}

pub(crate) async fn event_check_in_handler<S>(
    State(service): Shared<S>,
    Path(event_id): Path<String>,
    axum::Json(request): axum::Json<StudentRef>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(service.event_check_in(&event_id, &request.student_id, now()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceRequest {
    pub admin_id: String,
    pub date: NaiveDate,
    pub present: Vec<String>,
}

pub(crate) async fn attendance_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<AttendanceRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    match service.mark_attendance(&request.admin_id, request.date, &request.present, now()) {
        Ok(summary) => {
            let payload = json!({
                "success": true,
                "message": summary.message(),
                "summary": summary,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => failure(error),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub code: String,
}

pub(crate) async fn login_student_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.login_student(&request.code))
}

pub(crate) async fn login_admin_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.login_admin(&request.code))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewStudentRequest {
    pub name: String,
    pub email: String,
}

pub(crate) async fn add_student_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<NewStudentRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.add_student(&request.name, &request.email, now()),
    )
}

/// Body is the raw CSV upload.
pub(crate) async fn import_roster_handler<S>(State(service): Shared<S>, body: String) -> Response
where
    S: SnapshotStore + 'static,
{
    match service.import_roster(&body, now()) {
        Ok(summary) => {
            let payload = json!({
                "success": !summary.added.is_empty(),
                "message": summary.message(),
                "added": summary.added,
                "duplicates": summary.duplicates,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => failure(error),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub admin_id: String,
    pub student_ids: Vec<String>,
}

pub(crate) async fn delete_students_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<BulkDeleteRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .delete_students(&request.admin_id, &request.student_ids)
            .map(|removed| format!("Moved {removed} students to Recently Deleted.")),
    )
}

pub(crate) async fn deleted_students_handler<S>(State(service): Shared<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    (StatusCode::OK, axum::Json(service.deleted_students())).into_response()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminRef {
    pub admin_id: String,
}

pub(crate) async fn restore_student_handler<S>(
    State(service): Shared<S>,
    Path(student_id): Path<String>,
    axum::Json(request): axum::Json<AdminRef>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service.restore_student(&request.admin_id, &student_id),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupRequest {
    pub admin_id: String,
    #[serde(flatten)]
    pub group: GroupDraft,
}

pub(crate) async fn groups_handler<S>(State(service): Shared<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    (StatusCode::OK, axum::Json(service.groups())).into_response()
}

pub(crate) async fn create_group_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<GroupRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.save_group(&request.admin_id, None, &request.group),
    )
}

pub(crate) async fn update_group_handler<S>(
    State(service): Shared<S>,
    Path(group_id): Path<String>,
    axum::Json(request): axum::Json<GroupRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service.save_group(&request.admin_id, Some(&group_id), &request.group),
    )
}

pub(crate) async fn delete_group_handler<S>(
    State(service): Shared<S>,
    Path((admin_id, group_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .delete_group(&admin_id, &group_id)
            .map(|()| "Group deleted.".to_string()),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreItemRequest {
    pub admin_id: String,
    #[serde(flatten)]
    pub item: StoreItemDraft,
}

pub(crate) async fn store_items_handler<S>(State(service): Shared<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    (StatusCode::OK, axum::Json(service.store_items())).into_response()
}

pub(crate) async fn create_item_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<StoreItemRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_store_item(&request.admin_id, request.item),
    )
}

pub(crate) async fn update_item_handler<S>(
    State(service): Shared<S>,
    Path(item_id): Path<String>,
    axum::Json(request): axum::Json<StoreItemRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service.update_store_item(&request.admin_id, &item_id, request.item),
    )
}

pub(crate) async fn delete_item_handler<S>(
    State(service): Shared<S>,
    Path((admin_id, item_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .delete_store_item(&admin_id, &item_id)
            .map(|()| "Item deleted.".to_string()),
    )
}

/// `actor_id` is the admin making the change.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminRequest {
    pub actor_id: String,
    #[serde(flatten)]
    pub admin: AdminDraft,
}

pub(crate) async fn create_admin_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<AdminRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_admin(&request.actor_id, &request.admin, now()),
    )
}

pub(crate) async fn update_admin_handler<S>(
    State(service): Shared<S>,
    Path(admin_id): Path<String>,
    axum::Json(request): axum::Json<AdminRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service.update_admin(&request.actor_id, &admin_id, &request.admin),
    )
}

pub(crate) async fn delete_admin_handler<S>(
    State(service): Shared<S>,
    Path((admin_id, target_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .delete_admin(&admin_id, &target_id)
            .map(|()| "Admin deleted.".to_string()),
    )
}

pub(crate) async fn student_handler<S>(
    State(service): Shared<S>,
    Path(student_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.student(&student_id))
}

pub(crate) async fn toggle_favorite_handler<S>(
    State(service): Shared<S>,
    Path((student_id, item_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service
            .toggle_favorite(&student_id, &item_id)
            .map(|favorite| json!({ "item_id": item_id, "favorite": favorite })),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartRequest {
    pub item_id: String,
}

pub(crate) async fn add_to_cart_handler<S>(
    State(service): Shared<S>,
    Path(student_id): Path<String>,
    axum::Json(request): axum::Json<CartRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .add_to_cart(&student_id, &request.item_id)
            .map(|()| "Added to cart.".to_string()),
    )
}

pub(crate) async fn remove_from_cart_handler<S>(
    State(service): Shared<S>,
    Path((student_id, item_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .remove_from_cart(&student_id, &item_id)
            .map(|()| "Removed from cart.".to_string()),
    )
}

/// Buys `item_id` directly when present, otherwise checks out the cart.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub item_id: Option<String>,
}

pub(crate) async fn purchase_handler<S>(
    State(service): Shared<S>,
    Path(student_id): Path<String>,
    axum::Json(request): axum::Json<PurchaseRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let result = match request.item_id.as_deref() {
        Some(item_id) => service.buy_now(&student_id, item_id, now()),
        None => service.checkout_cart(&student_id, now()),
    };

    match result {
        Ok(receipt) => {
            let payload = json!({
                "success": true,
                "message": receipt.message(),
                "receipt": receipt,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => failure(error),
    }
}

pub(crate) async fn notifications_handler<S>(
    State(service): Shared<S>,
    Path(student_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.notifications(&student_id))
}

pub(crate) async fn mark_read_handler<S>(
    State(service): Shared<S>,
    Path(student_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service
            .mark_notifications_read(&student_id)
            .map(|marked| json!({ "marked_read": marked })),
    )
}

pub(crate) async fn pending_orders_handler<S>(State(service): Shared<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    (StatusCode::OK, axum::Json(service.pending_orders())).into_response()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderReadyRequest {
    pub admin_id: String,
    pub student_id: String,
    pub order_id: PurchaseId,
}

pub(crate) async fn order_ready_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<OrderReadyRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(service.mark_order_ready(
        &request.admin_id,
        &request.student_id,
        &request.order_id,
        now(),
    ))
}

pub(crate) async fn active_passes_handler<S>(State(service): Shared<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    (StatusCode::OK, axum::Json(service.active_hall_passes())).into_response()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HallPassRequest {
    pub student_id: String,
    pub kind: HallPassKind,
}

pub(crate) async fn request_pass_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<HallPassRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.request_hall_pass(&request.student_id, request.kind, now()),
    )
}

pub(crate) async fn return_pass_handler<S>(
    State(service): Shared<S>,
    Path(pass_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(StatusCode::OK, service.return_hall_pass(&pass_id, now()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockoutRequest {
    pub admin_id: String,
    pub label: String,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
}

pub(crate) async fn add_lockout_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<LockoutRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let parse = |raw: &str| NaiveTime::parse_from_str(raw.trim(), "%H:%M");
    let (Ok(start_time), Ok(end_time)) = (parse(&request.start_time), parse(&request.end_time))
    else {
        return invalid_request("Lockout times must be HH:MM.");
    };

    respond(
        StatusCode::CREATED,
        service.add_lockout(&request.admin_id, &request.label, start_time, end_time),
    )
}

pub(crate) async fn remove_lockout_handler<S>(
    State(service): Shared<S>,
    Path((admin_id, lockout_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service
            .remove_lockout(&admin_id, &lockout_id)
            .map(|removed| json!({ "removed": removed })),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConflictRequest {
    pub admin_id: String,
    pub student_ids: [String; 2],
    #[serde(default)]
    pub reason: Option<String>,
}

pub(crate) async fn add_conflict_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<ConflictRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let [first, second] = &request.student_ids;
    respond(
        StatusCode::CREATED,
        service.add_buddy_conflict(&request.admin_id, first, second, request.reason.as_deref()),
    )
}

pub(crate) async fn remove_conflict_handler<S>(
    State(service): Shared<S>,
    Path((admin_id, conflict_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service
            .remove_buddy_conflict(&admin_id, &conflict_id)
            .map(|removed| json!({ "removed": removed })),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollRequest {
    pub admin_id: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
}

pub(crate) async fn create_poll_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<PollRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_poll(
            &request.admin_id,
            &request.question,
            &request.options,
            request.expires_at,
            now(),
        ),
    )
}

pub(crate) async fn active_polls_handler<S>(State(service): Shared<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    (StatusCode::OK, axum::Json(service.active_polls(now()))).into_response()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    pub student_id: String,
    pub option_id: String,
}

pub(crate) async fn vote_handler<S>(
    State(service): Shared<S>,
    Path(poll_id): Path<String>,
    axum::Json(request): axum::Json<VoteRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::OK,
        service.vote(&request.student_id, &poll_id, &request.option_id, now()),
    )
}

pub(crate) async fn delete_poll_handler<S>(
    State(service): Shared<S>,
    Path((admin_id, poll_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .delete_poll(&admin_id, &poll_id)
            .map(|()| "Poll deleted.".to_string()),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnnouncementRequest {
    pub admin_id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
}

pub(crate) async fn post_announcement_handler<S>(
    State(service): Shared<S>,
    axum::Json(request): axum::Json<AnnouncementRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service.post_announcement(
            &request.admin_id,
            &request.title,
            &request.content,
            request.expires_at,
            now(),
        ),
    )
}

pub(crate) async fn active_announcements_handler<S>(State(service): Shared<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    (StatusCode::OK, axum::Json(service.active_announcements(now()))).into_response()
}

pub(crate) async fn delete_announcement_handler<S>(
    State(service): Shared<S>,
    Path((admin_id, announcement_id)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    acknowledge(
        service
            .delete_announcement(&admin_id, &announcement_id)
            .map(|()| "Announcement deleted.".to_string()),
    )
}
