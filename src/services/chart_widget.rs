use serde_json::json;

use crate::models::Timeframe;

/// Embed options for the TradingView widget on the detail page.
pub fn widget_config(symbol: &str, timeframe: Timeframe) -> serde_json::Value {
    let symbol = symbol.trim().to_uppercase();
    json!({
        "autosize": true,
        "symbol": format!("BINANCE:{symbol}USDT"),
        "interval": timeframe.chart_interval(),
        "timezone": "Etc/UTC",
        "theme": "dark",
        "style": "1",
        "locale": "en",
        "toolbar_bg": "#0f172a",
        "enable_publishing": false,
        "hide_top_toolbar": false,
        "hide_legend": false,
        "save_image": false,
        "container_id": format!("tv_chart_{symbol}_{}", timeframe.chart_interval()),
        "backgroundColor": "#0f172a",
        "gridColor": "rgba(30, 41, 59, 0.2)",
        "studies": [
            "MASimple@tv-basicstudies",
            "RSI@tv-basicstudies",
            "Volume@tv-basicstudies"
        ],
        "disabled_features": ["header_screenshot", "header_symbol_search"],
        "enabled_features": ["study_templates"],
    })
}
