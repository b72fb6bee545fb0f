pub mod health_event;
