pub mod inscription_normalizing;
