pub mod d001_widget_dashboard;
