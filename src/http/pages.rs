//! Embedded storefront pages.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

pub async fn checkout_success() -> Html<&'static str> {
    Html(include_str!("../../assets/checkout_success.html"))
}

pub async fn checkout_cancel() -> Html<&'static str> {
    Html(include_str!("../../assets/checkout_cancel.html"))
}
