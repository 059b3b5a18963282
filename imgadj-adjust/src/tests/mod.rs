mod udev_tests;
