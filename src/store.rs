//! View-state store
//!
//! Single owner of navigation, session and the editable content
//! collections. Every mutation goes through a named operation; list
//! filtering is a read-time projection and never touches the collections.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::seed;
use crate::types::{Broker, NewsArticle, Role, User};

/// Navigation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum View {
    Home,
    ArticleDetail,
    Admin,
    /// Simulated landing page for any other section ("Signals", "Calendar", ...)
    Section(String),
}

impl View {
    pub fn label(&self) -> &str {
        match self {
            View::Home => "Home",
            View::ArticleDetail => "ArticleDetail",
            View::Admin => "Admin",
            View::Section(name) => name,
        }
    }
}

impl From<String> for View {
    fn from(label: String) -> Self {
        match label.trim() {
            "" | "Home" => View::Home,
            "ArticleDetail" => View::ArticleDetail,
            "Admin" => View::Admin,
            other => View::Section(other.to_string()),
        }
    }
}

impl From<&str> for View {
    fn from(label: &str) -> Self {
        View::from(label.to_string())
    }
}

impl From<View> for String {
    fn from(view: View) -> Self {
        view.label().to_string()
    }
}

/// What the presentation layer should render for the current state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Page {
    Home {
        search_query: String,
        /// Featured article and outlook panel are hidden while searching
        show_featured: bool,
    },
    ArticleDetail {
        article: NewsArticle,
    },
    Admin,
    Section {
        title: String,
    },
}

/// Navigation, session and content state
#[derive(Debug, Clone)]
pub struct Store {
    active_view: View,
    search_query: String,
    selected_article: Option<NewsArticle>,
    session: Option<User>,
    login_open: bool,
    news: Vec<NewsArticle>,
    brokers: Vec<Broker>,
    /// Bumped whenever the presentation layer should scroll back to the top
    scroll_epoch: u64,
}

impl Store {
    /// Empty store on the home view
    pub fn new() -> Self {
        Self {
            active_view: View::Home,
            search_query: String::new(),
            selected_article: None,
            session: None,
            login_open: false,
            news: Vec::new(),
            brokers: Vec::new(),
            scroll_epoch: 0,
        }
    }

    /// Store with the startup articles and brokers
    pub fn seeded() -> Self {
        Self {
            news: seed::initial_news(),
            brokers: seed::initial_brokers(),
            ..Self::new()
        }
    }

    pub fn active_view(&self) -> &View {
        &self.active_view
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn selected_article(&self) -> Option<&NewsArticle> {
        self.selected_article.as_ref()
    }

    pub fn session(&self) -> Option<&User> {
        self.session.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().map(User::is_admin).unwrap_or(false)
    }

    pub fn login_open(&self) -> bool {
        self.login_open
    }

    pub fn news(&self) -> &[NewsArticle] {
        &self.news
    }

    pub fn brokers(&self) -> &[Broker] {
        &self.brokers
    }

    pub fn scroll_epoch(&self) -> u64 {
        self.scroll_epoch
    }

    /// Switch view, clearing the search query and any selected article
    pub fn navigate(&mut self, target: impl Into<View>) {
        let target = target.into();
        debug!("Navigate {} -> {}", self.active_view.label(), target.label());
        self.active_view = target;
        self.search_query.clear();
        self.selected_article = None;
        self.scroll_epoch += 1;
    }

    pub fn open_login(&mut self) {
        self.login_open = true;
    }

    pub fn close_login(&mut self) {
        self.login_open = false;
    }

    /// Start a session for `email`.
    ///
    /// No credential check is performed: every login is granted the admin
    /// role in this build.
    pub fn login(&mut self, email: &str) -> &User {
        info!("Login accepted for {}", email);
        self.login_open = false;
        self.session.insert(User {
            email: email.to_string(),
            role: Role::Admin,
            logged_in_at: Utc::now(),
        })
    }

    /// End the session. Leaving while on the admin view returns home.
    pub fn logout(&mut self) {
        if let Some(user) = self.session.take() {
            info!("Logout for {}", user.email);
        }
        if self.active_view == View::Admin {
            self.active_view = View::Home;
        }
    }

    /// Insert at the front of the feed. An article reusing an existing id
    /// replaces the older entry so ids stay unique.
    pub fn add_article(&mut self, article: NewsArticle) {
        self.news.retain(|a| a.id != article.id);
        info!("Article added: {} ({})", article.id, article.title);
        self.news.insert(0, article);
    }

    /// Remove by id. Absent ids are a no-op.
    pub fn remove_article(&mut self, id: &str) {
        let before = self.news.len();
        self.news.retain(|a| a.id != id);
        if self.news.len() != before {
            info!("Article removed: {}", id);
        }
        if self.selected_article.as_ref().is_some_and(|a| a.id == id) {
            self.selected_article = None;
        }
    }

    /// Insert at the front of the broker list, replacing a same-id entry
    pub fn add_broker(&mut self, broker: Broker) {
        self.brokers.retain(|b| b.id != broker.id);
        info!("Broker added: {} ({})", broker.id, broker.name);
        self.brokers.insert(0, broker);
    }

    /// Remove by id. Absent ids are a no-op.
    pub fn remove_broker(&mut self, id: &str) {
        let before = self.brokers.len();
        self.brokers.retain(|b| b.id != id);
        if self.brokers.len() != before {
            info!("Broker removed: {}", id);
        }
    }

    /// Show `article` in the detail view
    pub fn select_article(&mut self, article: NewsArticle) {
        debug!("Selected article {}", article.id);
        self.selected_article = Some(article);
        self.active_view = View::ArticleDetail;
        self.scroll_epoch += 1;
    }

    /// Select a feed article by id. Unknown ids fall back to the home view.
    pub fn select_article_by_id(&mut self, id: &str) -> bool {
        match self.news.iter().find(|a| a.id == id).cloned() {
            Some(article) => {
                self.select_article(article);
                true
            }
            None => {
                debug!("Article {} not found, returning home", id);
                self.navigate(View::Home);
                false
            }
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Feed articles matching the current search query
    pub fn filtered_news(&self) -> Vec<&NewsArticle> {
        self.news.iter().filter(|a| a.matches(&self.search_query)).collect()
    }

    /// Resolve the active view into something renderable. Views whose
    /// preconditions no longer hold degrade to home.
    pub fn current_page(&self) -> Page {
        match &self.active_view {
            View::Admin if self.is_admin() => Page::Admin,
            View::ArticleDetail => match &self.selected_article {
                Some(article) => Page::ArticleDetail {
                    article: article.clone(),
                },
                None => self.home_page(),
            },
            View::Section(title) => Page::Section {
                title: title.clone(),
            },
            View::Admin | View::Home => self.home_page(),
        }
    }

    fn home_page(&self) -> Page {
        Page::Home {
            search_query: self.search_query.clone(),
            show_featured: self.search_query.is_empty(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn article(id: &str) -> NewsArticle {
        NewsArticle {
            id: id.to_string(),
            title: format!("Title {}", id),
            category: "Analysis".to_string(),
            timestamp: "Just now".to_string(),
            image: String::new(),
            summary: format!("Summary {}", id),
        }
    }

    fn ids(store: &Store) -> Vec<&str> {
        store.news().iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_add_remove_keeps_most_recent_first() {
        let mut store = Store::new();
        store.add_article(article("a"));
        store.add_article(article("b"));
        store.add_article(article("c"));
        store.remove_article("b");
        store.add_article(article("d"));
        store.remove_article("missing");

        assert_eq!(ids(&store), vec!["d", "c", "a"]);
    }

    #[derive(Debug, Clone)]
    enum Edit {
        Add(u8),
        Remove(u8),
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            (0u8..8).prop_map(Edit::Add),
            (0u8..8).prop_map(Edit::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_news_matches_newest_first_model(edits in prop::collection::vec(edit(), 0..40)) {
            let mut store = Store::new();
            let mut model: Vec<String> = Vec::new();

            for edit in &edits {
                match edit {
                    Edit::Add(n) => {
                        let id = n.to_string();
                        store.add_article(article(&id));
                        model.retain(|m| m != &id);
                        model.insert(0, id);
                    }
                    Edit::Remove(n) => {
                        let id = n.to_string();
                        store.remove_article(&id);
                        model.retain(|m| m != &id);
                    }
                }
            }

            prop_assert_eq!(ids(&store), model.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn prop_brokers_match_newest_first_model(edits in prop::collection::vec(edit(), 0..40)) {
            let mut store = Store::new();
            let mut model: Vec<String> = Vec::new();

            for edit in &edits {
                match edit {
                    Edit::Add(n) => {
                        let id = format!("b{}", n);
                        store.add_broker(Broker {
                            id: id.clone(),
                            name: id.clone(),
                            rating: 4.0,
                            logo: String::new(),
                            min_deposit: "$100".to_string(),
                            leverage: "1:30".to_string(),
                            regulation: "FCA".to_string(),
                            link: "#".to_string(),
                        });
                        model.retain(|m| m != &id);
                        model.insert(0, id);
                    }
                    Edit::Remove(n) => {
                        let id = format!("b{}", n);
                        store.remove_broker(&id);
                        model.retain(|m| m != &id);
                    }
                }
            }

            let got: Vec<&str> = store.brokers().iter().map(|b| b.id.as_str()).collect();
            prop_assert_eq!(got, model.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut store = Store::seeded();
        let before = store.news().to_vec();
        store.remove_article("nope");
        store.remove_broker("nope");
        assert_eq!(store.news(), before.as_slice());
        assert_eq!(store.brokers().len(), 3);
    }

    #[test]
    fn test_duplicate_id_replaces_older_entry() {
        let mut store = Store::new();
        store.add_article(article("a"));
        store.add_article(article("b"));
        store.add_article(article("a"));
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_broker_add_remove() {
        let mut store = Store::seeded();
        let mut broker = store.brokers()[0].clone();
        broker.id = "new".to_string();
        store.add_broker(broker);
        assert_eq!(store.brokers()[0].id, "new");

        store.remove_broker("b2");
        let ids: Vec<_> = store.brokers().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "b1", "b3"]);
    }

    #[test]
    fn test_navigate_clears_query_and_selection() {
        let mut store = Store::seeded();
        store.select_article(article("x"));
        store.set_search_query("gold");
        let epoch = store.scroll_epoch();

        store.navigate("Signals");

        assert_eq!(store.active_view(), &View::Section("Signals".to_string()));
        assert_eq!(store.search_query(), "");
        assert!(store.selected_article().is_none());
        assert!(store.scroll_epoch() > epoch);
    }

    #[test]
    fn test_login_always_grants_admin() {
        let mut store = Store::new();
        store.open_login();
        let user = store.login("someone@example.com");
        assert_eq!(user.role, Role::Admin);
        assert!(store.is_admin());
        assert!(!store.login_open());
    }

    #[test]
    fn test_logout_from_admin_returns_home() {
        let mut store = Store::new();
        store.login("admin@demo.com");
        store.navigate(View::Admin);
        assert_eq!(store.current_page(), Page::Admin);

        store.logout();
        assert!(store.session().is_none());
        assert_eq!(store.active_view(), &View::Home);
    }

    #[test]
    fn test_logout_elsewhere_preserves_view() {
        let mut store = Store::new();
        store.login("admin@demo.com");
        store.navigate("Calendar");
        store.logout();
        assert_eq!(store.active_view(), &View::Section("Calendar".to_string()));
    }

    #[test]
    fn test_admin_view_without_session_renders_home() {
        let mut store = Store::new();
        store.navigate(View::Admin);
        assert!(matches!(store.current_page(), Page::Home { .. }));
    }

    #[test]
    fn test_detail_view_without_selection_renders_home() {
        let mut store = Store::seeded();
        store.navigate(View::ArticleDetail);
        assert!(matches!(store.current_page(), Page::Home { .. }));
    }

    #[test]
    fn test_removing_selected_article_degrades_to_home() {
        let mut store = Store::seeded();
        assert!(store.select_article_by_id("2"));
        assert!(matches!(store.current_page(), Page::ArticleDetail { .. }));

        store.remove_article("2");
        assert!(matches!(store.current_page(), Page::Home { .. }));
    }

    #[test]
    fn test_select_unknown_article_goes_home() {
        let mut store = Store::seeded();
        store.navigate("Education");
        assert!(!store.select_article_by_id("deleted"));
        assert_eq!(store.active_view(), &View::Home);
    }

    #[test]
    fn test_search_filters_without_mutating() {
        let mut store = Store::seeded();
        store.set_search_query("GOLD");
        let hits: Vec<_> = store.filtered_news().iter().map(|a| a.id.clone()).collect();
        assert_eq!(hits, vec!["2"]);
        assert_eq!(store.news().len(), 3);

        assert_eq!(
            store.current_page(),
            Page::Home {
                search_query: "GOLD".to_string(),
                show_featured: false,
            }
        );
    }

    #[test]
    fn test_view_labels_round_trip_through_strings() {
        assert_eq!(View::from("Admin"), View::Admin);
        assert_eq!(View::from(""), View::Home);
        assert_eq!(String::from(View::Section("Live Rates".into())), "Live Rates");
    }
}
