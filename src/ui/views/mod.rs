mod customer_detail;
mod customer_list;

pub use customer_detail::CustomerDetailView;
pub use customer_list::CustomerListView;
