pub mod reconnector;
