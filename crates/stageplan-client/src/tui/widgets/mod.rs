pub mod axis_header;
pub mod detail_panel;
pub mod gantt_view;
pub mod help_popup;
pub mod status_bar;
