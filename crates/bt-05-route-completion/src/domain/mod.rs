pub mod aggregate;

pub use aggregate::{
    confirm_full_baskets, mark_verified, merge_remote, record_full_basket, record_loose_items,
    recompute, reset,
};
