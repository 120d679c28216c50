pub mod mosaic_renderer;
