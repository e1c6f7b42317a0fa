//! Server-rendered HTML pages.
//!
//! Every value that reaches the markup goes through `html_escape`.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::clients::cat_api::ImageSearchPayload;
use crate::services::{HistoryEntry, SearchOptions};

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>
<nav><a href="/">Home</a> | <a href="/searchCats">Search</a> | <a href="/searchHistory">History</a></nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = text(title),
    )
}

#[must_use]
pub fn home() -> String {
    layout(
        "Cat Search",
        r#"<p>Find cat pictures by breed or category, or just get a random bunch.</p>
<ul>
<li><a href="/searchCats">Search for cats</a></li>
<li><a href="/searchHistory">See recent searches</a></li>
</ul>"#,
    )
}

#[must_use]
pub fn search_form(options: &SearchOptions) -> String {
    let mut breeds = String::from(r#"<option value="">Any breed</option>"#);
    for breed in &options.breeds {
        let _ = write!(
            breeds,
            r#"<option value="{}">{}</option>"#,
            attr(&breed.id),
            text(&breed.name)
        );
    }

    let mut categories = String::from(r#"<option value="">Any category</option>"#);
    for category in &options.categories {
        let _ = write!(
            categories,
            r#"<option value="{}">{}</option>"#,
            attr(&category.id),
            text(&category.name)
        );
    }

    let body = format!(
        r#"<form action="/processSearchCats" method="post">
<p><label><input type="checkbox" name="random_cats" value="true"> Random cats</label></p>
<p><label>Breed <select name="breed_ids">{breeds}</select></label></p>
<p><label>Category <select name="category_ids">{categories}</select></label></p>
<p><button type="submit">Search</button></p>
</form>"#
    );

    layout("Search Cats", &body)
}

#[must_use]
pub fn search_results(payload: &ImageSearchPayload) -> String {
    let images = payload.images();

    let body = if images.is_empty() {
        String::from("<p>No cats found.</p>")
    } else {
        let mut grid = String::from(r#"<div class="cats">"#);
        for image in images {
            let _ = write!(
                grid,
                r#"<figure><img src="{}" alt="Cat {}" loading="lazy"></figure>"#,
                attr(&image.url),
                attr(&image.id)
            );
        }
        grid.push_str("</div>");
        grid
    };

    layout(
        "Search Results",
        &format!(r#"{body}<p><a href="/searchCats">Search again</a></p>"#),
    )
}

#[must_use]
pub fn search_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return layout("Search History", "<p>No searches yet.</p>");
    }

    let mut rows = String::new();
    for entry in history {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            text(&entry.record.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            text(entry.breed_name.as_deref().unwrap_or("Any")),
            text(entry.category_name.as_deref().unwrap_or("Any")),
            if entry.record.random_requested() {
                "Yes"
            } else {
                "No"
            },
        );
    }

    let body = format!(
        "<table>\n<thead><tr><th>When</th><th>Breed</th><th>Category</th><th>Random</th></tr></thead>\n<tbody>{rows}</tbody>\n</table>"
    );

    layout("Search History", &body)
}
