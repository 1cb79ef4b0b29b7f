use handlebars::{handlebars_helper, Handlebars};
use std::sync::Arc;

use super::render::usd;

pub type Hbs = Arc<Handlebars<'static>>;

handlebars_helper!(usd_helper: |cents: i64| usd(cents));

pub fn build_handlebars() -> Hbs {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(false);
    hb.register_helper("usd", Box::new(usd_helper));

    // Layout + pages
    hb.register_template_file("layouts/base", "templates/layouts/base.hbs")
        .expect("template layouts/base");

    hb.register_template_file("pages/index", "templates/pages/index.hbs")
        .expect("template pages/index");
    hb.register_template_file("pages/apology", "templates/pages/apology.hbs")
        .expect("template pages/apology");
    hb.register_template_file("pages/not_found", "templates/pages/not_found.hbs")
        .expect("template pages/not_found");
    hb.register_template_file("pages/login", "templates/pages/login.hbs")
        .expect("template pages/login");
    hb.register_template_file("pages/register", "templates/pages/register.hbs")
        .expect("template pages/register");

    hb.register_template_file("pages/buy", "templates/pages/buy.hbs")
        .expect("template pages/buy");
    hb.register_template_file("pages/sell", "templates/pages/sell.hbs")
        .expect("template pages/sell");
    hb.register_template_file("pages/quote", "templates/pages/quote.hbs")
        .expect("template pages/quote");
    hb.register_template_file("pages/quoted", "templates/pages/quoted.hbs")
        .expect("template pages/quoted");
    hb.register_template_file("pages/history", "templates/pages/history.hbs")
        .expect("template pages/history");

    let navbar = std::fs::read_to_string("templates/partials/navbar.hbs")
        .expect("partials/navbar.hbs");
    hb.register_partial("navbar", navbar).expect("register navbar partial");

    let trade_form = std::fs::read_to_string("templates/partials/trade_form.hbs")
        .expect("partials/trade_form.hbs");
    hb.register_partial("trade_form", trade_form).expect("register trade_form partial");

    Arc::new(hb)
}
