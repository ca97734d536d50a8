mod record_detail;
mod resource_list;

pub use record_detail::RecordDetailView;
pub use resource_list::ResourceListView;
