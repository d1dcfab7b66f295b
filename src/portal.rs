//! Portal aggregate
//!
//! Everything the presentation layer reads lives here, behind one lock.
//! Analysis requests are awaited with the lock released and applied back
//! through the panel's ticket check.

use std::time::Instant;
use tokio::sync::RwLock;
use tracing::info;

use crate::admin::{AdminTab, ContentFlow, ContentForm, ContentKind, Submission};
use crate::analysis::{MarketAnalyst, OutlookPanel, PairAnalysisPanel};
use crate::market::MarketBoard;
use crate::newsletter::Newsletter;
use crate::seed;
use crate::store::{Store, View};
use crate::types::{PortalError, Result};

#[derive(Debug, Clone)]
pub struct Portal {
    pub store: Store,
    pub market: MarketBoard,
    pub content: ContentFlow,
    pub admin_tab: AdminTab,
    pub newsletter: Newsletter,
    pub outlook: OutlookPanel,
    pub pair_analysis: PairAnalysisPanel,
}

impl Portal {
    /// Portal with the startup content and quotes
    pub fn seeded() -> Self {
        Self {
            store: Store::seeded(),
            market: MarketBoard::seeded(),
            content: ContentFlow::new(),
            admin_tab: AdminTab::default(),
            newsletter: Newsletter::new(),
            outlook: OutlookPanel::new(),
            pair_analysis: PairAnalysisPanel::new(),
        }
    }

    /// Whether `expire(now)` has anything to apply
    pub fn timers_due(&self, now: Instant) -> bool {
        self.content.is_due(now) || self.newsletter.is_due(now)
    }

    /// Apply time-based UI transitions that are due at `now`
    pub fn expire(&mut self, now: Instant) {
        self.content.expire(now);
        self.newsletter.advance(now);
    }

    /// Switch view. Panels owned by the view being left are torn down.
    pub fn navigate(&mut self, target: impl Into<View>) {
        let previous = self.store.active_view().clone();
        self.store.navigate(target);
        self.left_view(&previous);
    }

    /// Select a feed article, falling back to home for unknown ids
    pub fn select_article_by_id(&mut self, id: &str) -> bool {
        let previous = self.store.active_view().clone();
        let found = self.store.select_article_by_id(id);
        self.left_view(&previous);
        found
    }

    /// Select the home page's featured article
    pub fn select_featured(&mut self) {
        let previous = self.store.active_view().clone();
        self.store.select_article(seed::featured_article());
        self.left_view(&previous);
    }

    /// End the session and drop any admin work in progress
    pub fn logout(&mut self) {
        self.store.logout();
        self.reset_admin();
    }

    fn left_view(&mut self, previous: &View) {
        let current = self.store.active_view();
        if previous == &View::Home && current != &View::Home {
            self.pair_analysis.dismiss();
        }
        if previous == &View::Admin && current != &View::Admin {
            self.reset_admin();
        }
    }

    fn reset_admin(&mut self) {
        self.content.close();
        self.admin_tab = AdminTab::default();
    }

    pub fn ensure_admin(&self) -> Result<()> {
        if self.store.is_admin() {
            Ok(())
        } else {
            Err(PortalError::AdminRequired)
        }
    }

    pub fn set_admin_tab(&mut self, tab: AdminTab) -> Result<()> {
        self.ensure_admin()?;
        self.admin_tab = tab;
        Ok(())
    }

    pub fn open_content_flow(&mut self, kind: Option<ContentKind>) -> Result<()> {
        self.ensure_admin()?;
        self.content.open(kind);
        Ok(())
    }

    pub fn choose_content_kind(&mut self, kind: ContentKind) -> Result<()> {
        self.ensure_admin()?;
        self.content.choose(kind);
        Ok(())
    }

    pub fn back_content_flow(&mut self) -> Result<()> {
        self.ensure_admin()?;
        self.content.back();
        Ok(())
    }

    pub fn close_content_flow(&mut self) -> Result<()> {
        self.ensure_admin()?;
        self.content.close();
        Ok(())
    }

    /// Remove a feed article. Immediate, no confirmation.
    pub fn delete_article(&mut self, id: &str) -> Result<()> {
        self.ensure_admin()?;
        self.store.remove_article(id);
        Ok(())
    }

    /// Remove a broker. Immediate, no confirmation.
    pub fn delete_broker(&mut self, id: &str) -> Result<()> {
        self.ensure_admin()?;
        self.store.remove_broker(id);
        Ok(())
    }

    /// Submit the open content form and add the result to the store
    pub fn submit_content(&mut self, form: ContentForm, now: Instant) -> Result<Submission> {
        self.ensure_admin()?;
        let submission = self.content.submit(form, now)?;
        match &submission {
            Submission::Article(article) => self.store.add_article(article.clone()),
            Submission::Broker(broker) => self.store.add_broker(broker.clone()),
        }
        Ok(submission)
    }
}

impl Default for Portal {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Fetch a fresh market outlook into the portal. Returns whether the
/// response was applied.
pub async fn refresh_outlook(portal: &RwLock<Portal>, analyst: &dyn MarketAnalyst) -> bool {
    let ticket = portal.write().await.outlook.begin();
    info!("Requesting market outlook from {}", analyst.name());
    let result = analyst.market_outlook().await;
    portal.write().await.outlook.complete(ticket, result)
}

/// Fetch an analysis for `symbol` into the pair panel. Returns whether the
/// response was applied; it is not when another pair was selected or the
/// panel was dismissed meanwhile.
pub async fn analyze_pair(
    portal: &RwLock<Portal>,
    analyst: &dyn MarketAnalyst,
    symbol: &str,
) -> bool {
    let ticket = portal.write().await.pair_analysis.begin(symbol);
    info!("Requesting {} analysis from {}", symbol, analyst.name());
    let result = analyst.pair_analysis(symbol).await;
    portal.write().await.pair_analysis.complete(ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{FlowState, NewsForm};
    use crate::analysis::PairAnalysis;

    fn pair_analysis() -> PairAnalysis {
        PairAnalysis {
            sentiment: "Bullish".to_string(),
            key_level: "1.0850".to_string(),
            trade_idea: "Buy dips".to_string(),
        }
    }

    #[test]
    fn test_submit_requires_admin() {
        let mut portal = Portal::seeded();
        portal.content.open(Some(ContentKind::News));
        let form = ContentForm::News(NewsForm {
            title: "t".into(),
            summary: "s".into(),
            ..NewsForm::default()
        });
        assert_eq!(
            portal.submit_content(form.clone(), Instant::now()),
            Err(PortalError::AdminRequired)
        );

        portal.store.login("admin@demo.com");
        let submission = portal.submit_content(form, Instant::now()).unwrap();
        let Submission::Article(article) = submission else {
            panic!("expected an article");
        };
        assert_eq!(portal.store.news()[0].id, article.id);
        assert_eq!(portal.store.news().len(), 4);
    }

    #[test]
    fn test_featured_article_selects_detail_view() {
        let mut portal = Portal::seeded();
        portal.select_featured();
        assert_eq!(portal.store.selected_article().unwrap().id, seed::FEATURED_ARTICLE_ID);
    }

    #[test]
    fn test_leaving_home_dismisses_pair_analysis() {
        let mut portal = Portal::seeded();
        let ticket = portal.pair_analysis.begin("EUR/USD");

        portal.navigate("Signals");
        assert_eq!(portal.pair_analysis.selected(), None);
        assert!(!portal.pair_analysis.complete(ticket, Ok(pair_analysis())));
        assert!(portal.pair_analysis.state().value().is_none());
    }

    #[test]
    fn test_ready_pair_analysis_cleared_on_article_select() {
        let mut portal = Portal::seeded();
        let ticket = portal.pair_analysis.begin("USD/JPY");
        assert!(portal.pair_analysis.complete(ticket, Ok(pair_analysis())));

        portal.select_article_by_id("1");
        assert_eq!(portal.pair_analysis.selected(), None);
        assert!(portal.pair_analysis.state().value().is_none());
    }

    #[test]
    fn test_home_to_home_keeps_pair_analysis() {
        let mut portal = Portal::seeded();
        let ticket = portal.pair_analysis.begin("EUR/USD");
        portal.navigate("Home");
        assert!(portal.pair_analysis.complete(ticket, Ok(pair_analysis())));
        assert_eq!(portal.pair_analysis.selected(), Some("EUR/USD"));
    }

    #[test]
    fn test_logout_resets_admin_flow_and_tab() {
        let mut portal = Portal::seeded();
        portal.store.login("admin@demo.com");
        portal.open_content_flow(None).unwrap();
        portal.set_admin_tab(AdminTab::Brokers).unwrap();

        portal.logout();
        portal.store.login("admin@demo.com");
        assert_eq!(portal.content.state(), FlowState::Closed);
        assert_eq!(portal.admin_tab, AdminTab::Overview);
    }

    #[test]
    fn test_leaving_admin_closes_flow() {
        let mut portal = Portal::seeded();
        portal.store.login("admin@demo.com");
        portal.navigate("Admin");
        portal.open_content_flow(Some(ContentKind::Broker)).unwrap();
        portal.set_admin_tab(AdminTab::News).unwrap();

        portal.navigate("Home");
        assert_eq!(portal.content.state(), FlowState::Closed);
        assert_eq!(portal.admin_tab, AdminTab::Overview);
    }

    #[test]
    fn test_admin_mutations_recheck_session() {
        let mut portal = Portal::seeded();
        assert_eq!(portal.delete_article("1"), Err(PortalError::AdminRequired));
        assert_eq!(portal.delete_broker("b1"), Err(PortalError::AdminRequired));
        assert_eq!(portal.set_admin_tab(AdminTab::News), Err(PortalError::AdminRequired));
        assert_eq!(portal.open_content_flow(None), Err(PortalError::AdminRequired));
        assert_eq!(portal.store.news().len(), 3);
        assert_eq!(portal.store.brokers().len(), 3);

        portal.store.login("admin@demo.com");
        portal.delete_article("1").unwrap();
        assert_eq!(portal.store.news().len(), 2);
    }

    #[test]
    fn test_timers_due_tracks_flow_and_newsletter() {
        let mut portal = Portal::seeded();
        let t0 = Instant::now();
        assert!(!portal.timers_due(t0));

        portal.newsletter.subscribe(t0);
        assert!(!portal.timers_due(t0));
        assert!(portal.timers_due(t0 + crate::newsletter::SUBSCRIBE_DELAY));
    }
}
