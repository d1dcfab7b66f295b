//! Startup content: the articles, brokers and quotes the portal boots with.

use crate::types::{Broker, MarketPair, MarketSignal, NewsArticle, SignalSide};

fn article(
    id: &str,
    title: &str,
    category: &str,
    timestamp: &str,
    image: &str,
    summary: &str,
) -> NewsArticle {
    NewsArticle {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        timestamp: timestamp.to_string(),
        image: image.to_string(),
        summary: summary.to_string(),
    }
}

fn broker(
    id: &str,
    name: &str,
    rating: f64,
    logo: &str,
    min_deposit: &str,
    leverage: &str,
    regulation: &str,
) -> Broker {
    Broker {
        id: id.to_string(),
        name: name.to_string(),
        rating,
        logo: logo.to_string(),
        min_deposit: min_deposit.to_string(),
        leverage: leverage.to_string(),
        regulation: regulation.to_string(),
        link: "#".to_string(),
    }
}

pub fn initial_news() -> Vec<NewsArticle> {
    vec![
        article(
            "1",
            "EUR/USD Forecast: Euro Gains Ground as Dollar Retreats on Rate Cut Hopes",
            "Analysis",
            "2 hours ago",
            "https://picsum.photos/seed/forex1/800/450",
            "The Euro is showing signs of recovery as US Treasury yields cool down following the latest labor market data releases. Technical indicators suggest a support zone at 1.0820...",
        ),
        article(
            "2",
            "Gold Prices Hit Record Highs as Safe Haven Demand Surges Amid Geopolitical Tensions",
            "Commodities",
            "4 hours ago",
            "https://picsum.photos/seed/gold/800/450",
            "Investors are flocking to bullion as a hedge against global uncertainty, driving prices past the $2,200 mark for the first time. Analysts predict further gains if central banks continue buying...",
        ),
        article(
            "3",
            "NFP Data Preview: What to Expect from the Upcoming US Jobs Report",
            "Forecast",
            "5 hours ago",
            "https://picsum.photos/seed/charts/800/450",
            "Economists are anticipating a steady growth in payrolls, but any deviation could spark massive volatility in the USD pairs. We break down the three most likely scenarios...",
        ),
    ]
}

/// Id of the featured article on the home page
pub const FEATURED_ARTICLE_ID: &str = "main";

/// Headline article shown above the feed. Selectable, but not part of the
/// editable collection.
pub fn featured_article() -> NewsArticle {
    article(
        FEATURED_ARTICLE_ID,
        "Will the Fed Cut Rates? Global Markets React to Inflation Surprise",
        "BREAKING",
        "LIVE NOW",
        "https://picsum.photos/seed/marketmain/1200/600",
        "Wall Street faces uncertainty as CPI figures beat expectations, leading analysts to revise their Q2 forecasts for USD/EUR pairs.",
    )
}

pub fn initial_brokers() -> Vec<Broker> {
    vec![
        broker(
            "b1",
            "Plus500",
            4.8,
            "https://picsum.photos/seed/p500/100/100",
            "$100",
            "1:30",
            "FCA, ASIC, CySEC",
        ),
        broker(
            "b2",
            "AvaTrade",
            4.5,
            "https://picsum.photos/seed/ava/100/100",
            "$100",
            "1:400",
            "FCA, FSCA",
        ),
        broker(
            "b3",
            "eToro",
            4.7,
            "https://picsum.photos/seed/etoro/100/100",
            "$50",
            "1:30",
            "CySEC, FCA",
        ),
    ]
}

/// Pairs in the scrolling ticker strip
pub fn ticker_pairs() -> Vec<MarketPair> {
    vec![
        MarketPair::seed("EUR/USD", 1.0845, 0.0012, 0.11),
        MarketPair::seed("GBP/USD", 1.2634, -0.0023, -0.18),
        MarketPair::seed("USD/JPY", 151.42, 0.15, 0.10),
        MarketPair::seed("AUD/USD", 0.6512, -0.0005, -0.08),
        MarketPair::seed("Gold", 2178.50, 12.40, 0.57),
        MarketPair::seed("BTC/USD", 68420.00, -1250.0, -1.79),
    ]
}

/// Pairs in the live rate grid
pub fn grid_pairs() -> Vec<MarketPair> {
    vec![
        MarketPair::seed("EUR/USD", 1.0845, 0.0012, 0.11),
        MarketPair::seed("GBP/USD", 1.2634, -0.0023, -0.18),
        MarketPair::seed("USD/JPY", 151.42, 0.15, 0.10),
        MarketPair::seed("USD/CHF", 0.9015, -0.0042, -0.46),
        MarketPair::seed("USD/CAD", 1.3582, 0.0051, 0.38),
    ]
}

pub fn top_signal() -> MarketSignal {
    MarketSignal {
        pair: "EUR/JPY".to_string(),
        side: SignalSide::Buy,
        entry: 163.42,
        tp: 164.80,
        sl: 162.90,
        confidence: 94,
    }
}
