pub mod formatter;

pub use formatter::{
    describe_rule, format_explain, format_json, format_number, format_score_table, format_stats,
    format_tsv, format_value, should_use_colors,
};
