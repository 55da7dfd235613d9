pub mod supabase;

pub use supabase::{is_conflict_error, ApiStatusError, SupabaseClient};
