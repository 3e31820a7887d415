pub mod money;

pub use money::{
    compute_total, format_amount, format_currency, line_total, parse_amount, TotalError,
    MAX_AMOUNT,
};
