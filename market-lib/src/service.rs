pub mod db_service;
