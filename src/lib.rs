//! Smali to Swagger - Swagger 2.0 documents from decompiled Android HTTP clients.
//!
//! Android apps usually talk to their backend through Retrofit interfaces. Once an APK is
//! decompiled to smali, those interfaces are still there: every endpoint is an abstract method
//! whose runtime annotations name the HTTP verb, the path template and the binding of each
//! parameter, and whose `Signature` annotation keeps the generic return type. This library reads
//! that metadata, follows the referenced model classes field by field, and assembles a Swagger
//! document describing the API.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively finds `.smali` files
//! 2. [`parser`] - Loads files and reads their class headers
//! 3. [`class_index`] - Maps class descriptors to the files declaring them
//! 4. [`extractor`] - Reads annotated methods and assembles endpoints
//! 5. [`type_resolver`] - Interprets type descriptors and builds object definitions
//! 6. [`schema_generator`] - Converts resolved types to Swagger schemas
//! 7. [`swagger_builder`] - Constructs the complete Swagger document
//! 8. [`serializer`] - Serializes the document to JSON or YAML
//!
//! # Example Usage
//!
//! ```no_run
//! use smali_swagger::{
//!     class_index::ClassIndex,
//!     extractor::{retrofit::RetrofitExtractor, EndpointExtractor},
//!     parser::SmaliParser,
//!     scanner::FileScanner,
//!     serializer::serialize_json,
//!     swagger_builder::SwaggerBuilder,
//!     type_resolver::TypeResolver,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./app-decompiled")).scan().unwrap();
//! let mut class_index = ClassIndex::new();
//! let mut endpoints = Vec::new();
//! SmaliParser::parse_each(&scan_result.smali_files, |file| {
//!     class_index.add_file(&file);
//!     endpoints.extend(RetrofitExtractor.extract_file(&file));
//! });
//!
//! let mut resolver = TypeResolver::new(class_index);
//! let mut builder = SwaggerBuilder::new();
//! builder.add_endpoints(&endpoints, &mut resolver).unwrap();
//! let document = builder.build(resolver);
//!
//! println!("{}", serialize_json(&document).unwrap());
//! ```
//!
//! [`cli::generate`] runs the same pipeline in one call; the [`cli`] module also holds the
//! command-line application.

pub mod class_index;
pub mod cli;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod swagger_builder;
pub mod type_resolver;
