// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt::Write as _;

use super::listing::{Listing, PageLink};

const STYLE: &str = "body { background: #1f1f1f; color: #c0c0c0; font-family: sans-serif; \
    text-align: center; }\n\
    a { color: #007acc; }\n\
    .file-container { display: inline-block; margin: 1em; }\n\
    .image-container img { max-width: 320px; }\n\
    .pagination a, .pagination span { margin: 0 0.25em; }\n";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>\n{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        title, STYLE, body
    )
}

/// Pagination controls, with up to two pages either side of the current one.
pub(crate) fn pagination(links: &[PageLink]) -> String {
    let mut html = String::from("<div class='pagination'>");
    for link in links {
        let _ = match link {
            PageLink::First => write!(html, "<a href='/?page=0'>&lt;&lt;</a> "),
            PageLink::Previous(page) => write!(html, "<a href='/?page={}'>&lt;</a> ", page),
            PageLink::Page(page) => write!(html, "<a href='/?page={}'>{}</a> ", page, page + 1),
            PageLink::Current(page) => write!(html, "<span>{}</span> ", page + 1),
            PageLink::Next(page) => write!(html, "<a href='/?page={}'>&gt;</a> ", page),
            PageLink::Last(page) => write!(html, "<a href='/?page={}'>&gt;&gt;</a>", page),
        };
    }
    html.push_str("</div>");
    html
}

pub(crate) fn index_page(listing: &Listing) -> String {
    let mut body = String::from("<h1>Thermal images</h1>\n");
    if listing.names.is_empty() {
        body.push_str("<p>No images</p>\n");
    }
    for name in &listing.names {
        let _ = write!(
            body,
            "<div class='file-container'>\
             <p><a href=\"/image?file={name}\">{name}</a></p>\
             <div class='image-container'><img src='/{name}' alt='{name}' /></div>\
             <p><a href=\"/download?file={name}\">Download</a> \
             <a href=\"/delete?file={name}&amp;page={page}\">Delete</a></p>\
             </div>\n",
            name = name,
            page = listing.page
        );
    }
    body.push_str(&pagination(&listing.links()));
    body.push('\n');
    page("Thermal images", &body)
}

pub(crate) fn image_page(name: &str) -> String {
    let body = format!(
        "<p><a href='/'>Back</a> <a href=\"/download?file={name}\">Download</a></p>\n\
         <img src='/{name}' alt='{name}' />\n",
        name = name
    );
    page(name, &body)
}
