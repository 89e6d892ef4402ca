/*!
# Tercih

Web backend for browsing Turkish university programs and their course plans.

## Overview

Program data lives in a Google Sheets spreadsheet. When the spreadsheet cannot be
reached the service reads a local Excel workbook instead, and when that is missing
too it serves a small built-in sample so the pages keep working.

## Architecture

### Data Layer
- **sheets**: Google Sheets v4 REST client (read, append, update, delete rows)
- **workbook**: Local `.xlsx` workbook reader and writer
- **source**: Fallback chain over the backends, reporting which one answered
- **loader**: Turns raw rows into records keyed by header, with localized numbers

### Domain Layer
- **collation**: Turkish alphabetical ordering and accent folding
- **listing**: Program search, filters and sorting
- **matching**: Fuzzy matching of Turkish institution and department names
- **course_plan**: Course-plan filtering built on the matcher
- **catalog**: Create, update and delete programs by program code

### Web Layer
- **app**: Routing, request logging and page rendering
- **error**: Mapping of failures to HTTP status codes

## REST API Endpoints

- `/api/status` - Which backend answered and how many programs it holds
- `/api/universiteler` - Program listing (`search`, `ulke`, `sehir`, `grup`, `sort_by`, `sort_order`)
- `/api/filtreler` - Distinct countries, cities and score groups
- `/api/universite/{program_kodu}` - Read, update or delete one program
- `/api/universite` - Create a program
- `/api/ders-plani` - Course-plan listing (`universite`, `fakulte`, `bolum`, `ders`, `search`)
- `/api/ders-plani/filtreler` - Distinct course-plan values per column
*/

#[cfg(feature = "web")]
pub mod app;
pub mod catalog;
pub mod collation;
pub mod config;
pub mod course_plan;
pub mod error;
pub mod listing;
pub mod loader;
pub mod matching;
pub mod sheets;
pub mod source;
pub mod workbook;

pub use config::Config;
pub use error::AppError;
pub use source::{DataSource, Origin};
