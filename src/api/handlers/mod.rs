//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod api_keys;
pub mod health;
pub mod redirect;
pub mod short_urls;
pub mod single_step;
pub mod tags;
pub mod visits;

pub use api_keys::{create_api_key_handler, disable_api_key_handler, list_api_keys_handler};
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use short_urls::{
    create_short_url_handler, delete_short_url_handler, edit_short_url_handler,
    get_short_url_handler, list_short_urls_handler, set_short_url_tags_handler,
};
pub use single_step::single_step_handler;
pub use tags::{create_tags_handler, delete_tags_handler, list_tags_handler, rename_tag_handler};
pub use visits::visits_handler;
