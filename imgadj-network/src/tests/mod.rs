mod staged_tests;
mod ubuntu_tests;
