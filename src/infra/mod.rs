mod gateway;
mod page_file;

pub use gateway::{DEFAULT_BASE_URL, GatewayError, MutationGateway};
pub use page_file::{LoadPageFileError, load_page_file, profile_id_from_page_name};
