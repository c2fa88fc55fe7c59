//! Sample source tree

use std::path::Path;

/// Credential planted in the sample tree; must never survive extraction
pub const SAMPLE_SECRET: &str = "sk-test-4f9a8b7c6d5e4f3a2b1c";

/// Files of the sample tree, root-relative
pub fn sample_files() -> Vec<(&'static str, String)> {
    vec![
        (
            "package.json",
            r#"{
  "name": "shop",
  "version": "1.0.0",
  "dependencies": {"express": "^4.19.2", "jsonwebtoken": "^9.0.2", "bcrypt": "^5.1.1"},
  "devDependencies": {"jest": "^29.7.0"}
}
"#
            .to_string(),
        ),
        (
            "src/app.js",
            "const express = require('express');\n\
             const app = express();\n\
             \n\
             app.post('/login', async (req, res) => {\n\
             \x20 res.json(await login(req.body));\n\
             });\n\
             app.get('/lists', requireAuth, listLists);\n"
                .to_string(),
        ),
        (
            "src/auth.js",
            format!(
                "const bcrypt = require('bcrypt');\n\
                 const jwt = require('jsonwebtoken');\n\
                 \n\
                 function issue(user) {{\n\
                 \x20 return jwt.sign({{ sub: user.id }}, \"{SAMPLE_SECRET}\");\n\
                 }}\n"
            ),
        ),
        (
            "prisma/schema.prisma",
            "model User {\n  id    String @id\n  email String @unique\n}\n".to_string(),
        ),
        (
            ".github/workflows/ci.yml",
            "name: CI\non:\n  push:\n  pull_request:\njobs:\n  test:\n    runs-on: ubuntu-latest\n"
                .to_string(),
        ),
        ("README.md", "# Shop\n\nSaved shopping lists.\n".to_string()),
        ("node_modules/express/index.js", "module.exports = {};\n".to_string()),
    ]
}

/// Write the sample tree under `root`
pub fn write_sample_repo(root: &Path) {
    for (path, text) in sample_files() {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, text).unwrap();
    }
}
