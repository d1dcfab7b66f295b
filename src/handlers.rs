use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::admin::{
    self, AdminTab, BrokerForm, ContentForm, ContentKind, DashboardStat, NewsForm, Submission,
};
use crate::analysis::{MarketOutlook, PairAnalysis, PanelState};
use crate::market::filter_pairs;
use crate::newsletter::NewsletterStatus;
use crate::portal::{self, Portal};
use crate::store::Page;
use crate::types::{Broker, MarketPair, MarketSignal, NewsArticle, PortalError, User};
use crate::AppState;

type ApiError = (StatusCode, String);

fn portal_error(e: PortalError) -> ApiError {
    let status = match e {
        PortalError::MissingField(_) | PortalError::InvalidField { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PortalError::AdminRequired => StatusCode::FORBIDDEN,
        PortalError::NoActiveForm | PortalError::WrongFormKind { .. } => StatusCode::CONFLICT,
    };
    (status, e.to_string())
}

/// Read access with due timers applied. The write lock is only taken when
/// a timer actually needs to fire.
async fn snapshot(state: &AppState) -> RwLockReadGuard<'_, Portal> {
    let now = Instant::now();
    {
        let portal = state.portal.read().await;
        if !portal.timers_due(now) {
            return portal;
        }
    }
    let mut portal = state.portal.write().await;
    portal.expire(now);
    portal.downgrade()
}

/// Write access with due timers applied
async fn current_mut(state: &AppState) -> RwLockWriteGuard<'_, Portal> {
    let mut portal = state.portal.write().await;
    portal.expire(Instant::now());
    portal
}

// --- Navigation and session ---

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub active_view: String,
    pub page: Page,
    pub search_query: String,
    pub session: Option<User>,
    pub login_open: bool,
    pub scroll_epoch: u64,
}

impl ViewResponse {
    fn from_portal(portal: &Portal) -> Self {
        let store = &portal.store;
        Self {
            active_view: store.active_view().label().to_string(),
            page: store.current_page(),
            search_query: store.search_query().to_string(),
            session: store.session().cloned(),
            login_open: store.login_open(),
            scroll_epoch: store.scroll_epoch(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// GET /view - What should be rendered right now
pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    let portal = snapshot(&state).await;
    Json(ViewResponse::from_portal(&portal))
}

/// POST /navigate - Panels owned by the view being left are closed
pub async fn navigate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NavigateRequest>,
) -> Json<ViewResponse> {
    let mut portal = current_mut(&state).await;
    portal.navigate(req.target);
    Json(ViewResponse::from_portal(&portal))
}

/// POST /search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ViewResponse> {
    let mut portal = current_mut(&state).await;
    portal.store.set_search_query(req.query);
    Json(ViewResponse::from_portal(&portal))
}

/// POST /articles/:id/select - Unknown ids land on the home view
pub async fn select_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ViewResponse> {
    let mut portal = current_mut(&state).await;
    portal.select_article_by_id(&id);
    Json(ViewResponse::from_portal(&portal))
}

/// POST /featured/select
pub async fn select_featured(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    let mut portal = current_mut(&state).await;
    portal.select_featured();
    Json(ViewResponse::from_portal(&portal))
}

/// POST /login/open
pub async fn open_login(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    let mut portal = current_mut(&state).await;
    portal.store.open_login();
    Json(ViewResponse::from_portal(&portal))
}

/// POST /login/close
pub async fn close_login(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    let mut portal = current_mut(&state).await;
    portal.store.close_login();
    Json(ViewResponse::from_portal(&portal))
}

/// POST /login - Both fields must be filled in; their values are not checked
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ViewResponse>, ApiError> {
    if req.email.trim().is_empty() {
        return Err(portal_error(PortalError::MissingField("email")));
    }
    if req.password.is_empty() {
        return Err(portal_error(PortalError::MissingField("password")));
    }

    let mut portal = current_mut(&state).await;
    portal.store.login(req.email.trim());
    Ok(Json(ViewResponse::from_portal(&portal)))
}

/// POST /logout - Also drops any admin work in progress
pub async fn logout(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    let mut portal = current_mut(&state).await;
    portal.logout();
    Json(ViewResponse::from_portal(&portal))
}

// --- Content ---

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub query: String,
    pub articles: Vec<NewsArticle>,
}

/// GET /news - Feed filtered by the current search query
pub async fn list_news(State(state): State<Arc<AppState>>) -> Json<NewsResponse> {
    let portal = snapshot(&state).await;
    Json(NewsResponse {
        query: portal.store.search_query().to_string(),
        articles: portal.store.filtered_news().into_iter().cloned().collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct BrokerEntry {
    #[serde(flatten)]
    pub broker: Broker,
    pub stars: u8,
}

/// GET /brokers
pub async fn list_brokers(State(state): State<Arc<AppState>>) -> Json<Vec<BrokerEntry>> {
    let portal = snapshot(&state).await;
    Json(
        portal
            .store
            .brokers()
            .iter()
            .map(|b| BrokerEntry {
                stars: b.stars(),
                broker: b.clone(),
            })
            .collect(),
    )
}

// --- Market data ---

#[derive(Debug, Serialize)]
pub struct TickerEntry {
    #[serde(flatten)]
    pub pair: MarketPair,
    pub display_price: String,
    pub highlighted: bool,
}

/// GET /ticker
pub async fn get_ticker(State(state): State<Arc<AppState>>) -> Json<Vec<TickerEntry>> {
    let portal = snapshot(&state).await;
    let highlighted = portal.market.highlighted_ticker(Instant::now());
    Json(
        portal
            .market
            .ticker()
            .iter()
            .enumerate()
            .map(|(i, p)| TickerEntry {
                display_price: p.display_price(),
                highlighted: highlighted == Some(i),
                pair: p.clone(),
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    q: Option<String>,
}

/// GET /rates - Grid pairs filtered by `q`, or by the search query when absent
pub async fn list_rates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RatesQuery>,
) -> Json<Vec<MarketPair>> {
    let portal = snapshot(&state).await;
    let filter = query
        .q
        .unwrap_or_else(|| portal.store.search_query().to_string());
    Json(
        filter_pairs(portal.market.grid(), &filter)
            .into_iter()
            .cloned()
            .collect(),
    )
}

/// GET /signal
pub async fn get_signal(State(state): State<Arc<AppState>>) -> Json<MarketSignal> {
    let portal = snapshot(&state).await;
    Json(portal.market.signal().clone())
}

// --- Analysis ---

/// GET /analysis - Cached market outlook
pub async fn get_outlook(
    State(state): State<Arc<AppState>>,
) -> Json<PanelState<MarketOutlook>> {
    let portal = snapshot(&state).await;
    Json(portal.outlook.state().clone())
}

/// POST /analysis/refresh - Request a new outlook and return the result
pub async fn refresh_outlook(
    State(state): State<Arc<AppState>>,
) -> Json<PanelState<MarketOutlook>> {
    portal::refresh_outlook(&state.portal, state.analyst.as_ref()).await;
    let portal = state.portal.read().await;
    Json(portal.outlook.state().clone())
}

#[derive(Debug, Deserialize)]
pub struct PairAnalysisRequest {
    pub symbol: String,
}

#[derive(Debug, Serialize)]
pub struct PairAnalysisResponse {
    pub symbol: Option<String>,
    pub bullish: Option<bool>,
    pub state: PanelState<PairAnalysis>,
}

impl PairAnalysisResponse {
    fn from_portal(portal: &Portal) -> Self {
        let state = portal.pair_analysis.state().clone();
        Self {
            symbol: portal.pair_analysis.selected().map(str::to_string),
            bullish: state.value().map(PairAnalysis::is_bullish),
            state,
        }
    }
}

/// POST /rates/analysis - Analyse one grid pair
pub async fn analyze_pair(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PairAnalysisRequest>,
) -> Result<Json<PairAnalysisResponse>, ApiError> {
    let symbol = {
        let portal = snapshot(&state).await;
        portal
            .market
            .grid_pair(&req.symbol)
            .map(|p| p.symbol.clone())
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    format!("Unknown pair: {}", req.symbol),
                )
            })?
    };

    portal::analyze_pair(&state.portal, state.analyst.as_ref(), &symbol).await;
    let portal = state.portal.read().await;
    Ok(Json(PairAnalysisResponse::from_portal(&portal)))
}

/// GET /rates/analysis
pub async fn get_pair_analysis(
    State(state): State<Arc<AppState>>,
) -> Json<PairAnalysisResponse> {
    let portal = snapshot(&state).await;
    Json(PairAnalysisResponse::from_portal(&portal))
}

/// DELETE /rates/analysis - Close the pair panel
pub async fn dismiss_pair_analysis(State(state): State<Arc<AppState>>) -> StatusCode {
    let mut portal = current_mut(&state).await;
    portal.pair_analysis.dismiss();
    StatusCode::NO_CONTENT
}

// --- Newsletter ---

#[derive(Debug, Serialize)]
pub struct NewsletterResponse {
    pub status: NewsletterStatus,
    pub accepted: bool,
}

/// POST /newsletter/subscribe
pub async fn subscribe(State(state): State<Arc<AppState>>) -> Json<NewsletterResponse> {
    let mut portal = current_mut(&state).await;
    let accepted = portal.newsletter.subscribe(Instant::now());
    Json(NewsletterResponse {
        status: portal.newsletter.status(),
        accepted,
    })
}

/// GET /newsletter
pub async fn get_newsletter(State(state): State<Arc<AppState>>) -> Json<NewsletterResponse> {
    let portal = snapshot(&state).await;
    Json(NewsletterResponse {
        status: portal.newsletter.status(),
        accepted: false,
    })
}

// --- Admin (behind admin_middleware, rechecked under the portal lock) ---

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub state: &'static str,
    pub kind: Option<ContentKind>,
    pub news_form: NewsForm,
    pub broker_form: BrokerForm,
    pub categories: Vec<&'static str>,
}

impl FlowResponse {
    fn from_portal(portal: &Portal) -> Self {
        let flow = &portal.content;
        Self {
            state: flow.state().name(),
            kind: flow.state().kind(),
            news_form: flow.news_form().clone(),
            broker_form: flow.broker_form().clone(),
            categories: admin::NEWS_CATEGORIES.to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub tab: AdminTab,
    pub stats: Vec<DashboardStat>,
    pub news: Vec<NewsArticle>,
    pub brokers: Vec<Broker>,
    pub flow: FlowResponse,
}

/// GET /admin - Dashboard contents
pub async fn get_admin(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminResponse>, ApiError> {
    let portal = snapshot(&state).await;
    portal.ensure_admin().map_err(portal_error)?;
    Ok(Json(AdminResponse {
        tab: portal.admin_tab,
        stats: admin::dashboard_stats(),
        news: portal.store.news().to_vec(),
        brokers: portal.store.brokers().to_vec(),
        flow: FlowResponse::from_portal(&portal),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TabRequest {
    pub tab: AdminTab,
}

/// POST /admin/tab
pub async fn set_admin_tab(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TabRequest>,
) -> Result<StatusCode, ApiError> {
    current_mut(&state)
        .await
        .set_admin_tab(req.tab)
        .map_err(portal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenFlowRequest {
    pub kind: Option<ContentKind>,
}

/// POST /admin/flow/open - Optional body picks the content type up front
pub async fn open_flow(
    State(state): State<Arc<AppState>>,
    body: Option<Json<OpenFlowRequest>>,
) -> Result<Json<FlowResponse>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let mut portal = current_mut(&state).await;
    portal.open_content_flow(req.kind).map_err(portal_error)?;
    Ok(Json(FlowResponse::from_portal(&portal)))
}

#[derive(Debug, Deserialize)]
pub struct ChooseTypeRequest {
    pub kind: ContentKind,
}

/// POST /admin/flow/type
pub async fn choose_flow_type(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChooseTypeRequest>,
) -> Result<Json<FlowResponse>, ApiError> {
    let mut portal = current_mut(&state).await;
    portal.choose_content_kind(req.kind).map_err(portal_error)?;
    Ok(Json(FlowResponse::from_portal(&portal)))
}

/// POST /admin/flow/back - From a form back to type selection
pub async fn back_flow(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlowResponse>, ApiError> {
    let mut portal = current_mut(&state).await;
    portal.back_content_flow().map_err(portal_error)?;
    Ok(Json(FlowResponse::from_portal(&portal)))
}

/// GET /admin/flow
pub async fn get_flow(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlowResponse>, ApiError> {
    let portal = snapshot(&state).await;
    portal.ensure_admin().map_err(portal_error)?;
    Ok(Json(FlowResponse::from_portal(&portal)))
}

/// POST /admin/flow/close
pub async fn close_flow(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlowResponse>, ApiError> {
    let mut portal = current_mut(&state).await;
    portal.close_content_flow().map_err(portal_error)?;
    Ok(Json(FlowResponse::from_portal(&portal)))
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: String,
    pub flow: FlowResponse,
}

/// POST /admin/flow/submit
pub async fn submit_flow(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ContentForm>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut portal = current_mut(&state).await;
    let submission = portal
        .submit_content(form, Instant::now())
        .map_err(portal_error)?;

    let id = match submission {
        Submission::Article(article) => article.id,
        Submission::Broker(broker) => broker.id,
    };
    info!("Admin content created: {}", id);

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id,
            flow: FlowResponse::from_portal(&portal),
        }),
    ))
}

/// DELETE /admin/news/:id - Immediate, no confirmation
pub async fn delete_news(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    current_mut(&state)
        .await
        .delete_article(&id)
        .map_err(portal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /admin/brokers/:id - Immediate, no confirmation
pub async fn delete_broker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    current_mut(&state)
        .await
        .delete_broker(&id)
        .map_err(portal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub analyst: String,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        analyst: state.analyst.name().to_string(),
    })
}
