pub mod a001_custom_widget;
pub mod d001_widget_dashboard;
