pub mod language;
pub mod locale;

pub use language::language_middleware;
pub use locale::locale_middleware;
