mod ticket_authority;
pub use ticket_authority::*;
