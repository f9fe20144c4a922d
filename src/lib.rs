/*!
# Grid Server

Server-side data engine for paged, sortable and searchable HTML grids, built in Rust.

## Overview

A grid widget running in the browser delegates all of its row handling to the server:
every time the user changes page, sort order or search text it sends one request
describing the new view, and the server answers with exactly the rows to show. The
full data set stays on the server, rendered once into cells that keep their markup and
plain text.

## Architecture

### Table Layer
- **cell** / **content**: cell content as a node tree, with lazily cached markup, side
  artifacts (scripts, styles) and plain text
- **row**: fixed cells plus optional id, class, data and attribute maps
- **server_data**: the rows of one grid behind a read/write lock, with its current sort state

### Request Layer
- **request**: parsing of the widget's flat parameters or JSON body
- **order**: typed, locale-aware column comparators and the cascading row comparator
- **search** / **filter**: plain text and regex terms, all-terms or any-term per row,
  per-column overrides
- **response**: paging and the JSON response document
- **engine**: sort if the order changed, filter, page

### Serving Layer
- **registry**: table ids mapped to tables, process-wide or injected
- **app** (feature `web`): axum routes answering grid requests
- **config** / **loader**: server settings and CSV import

## Design Highlights

- A table is re-sorted only when a request asks for a different order, and only once
  even if many requests ask for the same new order at the same time
- Each request sees one consistent row order from sorting through paging
- Markup and plain text of a cell are derived at most once

## REST API Endpoints

- `GET /ajax/datatables?object={id}&draw=...` - Answers a grid request
- `POST /ajax/datatables` - Same, with a JSON body
- `GET /api/tables` - Lists registered tables
*/

pub mod cell;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod filter;
pub mod loader;
pub mod locale;
pub mod order;
pub mod registry;
pub mod request;
pub mod response;
pub mod row;
pub mod search;
pub mod server_data;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the main types to make them easier to use
pub use cell::Cell;
pub use config::ServerConfig;
pub use content::{Node, SideArtifacts};
pub use engine::{handle_request, serve};
pub use error::{ContentError, GridError, Result};
pub use locale::Locale;
pub use order::{ColumnType, OrderSpec, SortDirection, SortState};
pub use registry::TableRegistry;
pub use request::{COUNT_ALL, RequestData};
pub use response::{ResponseData, ResponseRow};
pub use row::{Row, RowSpec};
pub use server_data::{FilterType, ServerData, TableBuilder};
