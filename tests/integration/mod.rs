// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod genai_rotation_test;
pub mod helpers;
pub mod submit_error_test;
pub mod supervisor_test;
pub mod workitem_test;
