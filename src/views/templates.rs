use handlebars::Handlebars;
use std::sync::Arc;

pub type Hbs = Arc<Handlebars<'static>>;

// Templates are compiled into the binary so pages render regardless of the
// working directory.
const TEMPLATES: &[(&str, &str)] = &[
    ("layouts/base", include_str!("../../templates/layouts/base.hbs")),
    ("pages/dashboard", include_str!("../../templates/pages/dashboard.hbs")),
    ("pages/scanner", include_str!("../../templates/pages/scanner.hbs")),
    ("pages/signals", include_str!("../../templates/pages/signals.hbs")),
    ("pages/detail", include_str!("../../templates/pages/detail.hbs")),
    ("pages/portfolio", include_str!("../../templates/pages/portfolio.hbs")),
    ("pages/alerts", include_str!("../../templates/pages/alerts.hbs")),
    ("pages/loading", include_str!("../../templates/pages/loading.hbs")),
    ("pages/not_found", include_str!("../../templates/pages/not_found.hbs")),
    // Partial endpoints
    ("partials/alerts_list", include_str!("../../templates/partials/alerts_list.hbs")),
    ("partials/watchlist_alerts", include_str!("../../templates/partials/watchlist_alerts.hbs")),
    ("partials/notifications", include_str!("../../templates/partials/notifications.hbs")),
    ("partials/explanation", include_str!("../../templates/partials/explanation.hbs")),
];

pub fn build_handlebars() -> Result<Hbs, handlebars::TemplateError> {
    let mut hb = Handlebars::new();

    for (name, source) in TEMPLATES {
        hb.register_template_string(name, *source)?;
    }

    hb.register_partial("navbar", include_str!("../../templates/partials/navbar.hbs"))?;

    Ok(Arc::new(hb))
}
