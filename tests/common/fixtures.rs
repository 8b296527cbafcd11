/// Plan with one passing and one failing case.
pub const SIMPLE_PLAN: &str = r#"{"kind":"Plan","name":"Tests","children":[{"kind":"Case","name":"t1","status":"Passed"},{"kind":"Case","name":"t2","status":"Failed","failureMessages":["assertion X"]}]}"#;

/// Suite claims Passed but holds a failed case.
pub const LYING_SUITE: &str = r#"{"kind":"Plan","name":"P","children":[{"kind":"Suite","name":"S","status":"Passed","children":[{"kind":"Case","name":"c","status":"Failed"}]}]}"#;

/// Plan with suites but not a single case.
pub const NO_CASES: &str = r#"{"kind":"Plan","name":"P","children":[{"kind":"Suite","name":"Empty","children":[]}]}"#;

/// Shaped like `xcresulttool get test-results tests` output.
pub const XCRESULT_TESTS: &str = r#"{
  "devices": [{"deviceName": "iPhone 15", "platform": "iOS Simulator"}],
  "testPlanConfigurations": [{"configurationId": "1", "configurationName": "Test Scheme Action"}],
  "testNodes": [
    {
      "name": "AppTests",
      "nodeType": "Test Plan",
      "result": "Failed",
      "children": [
        {
          "name": "AppTests",
          "nodeType": "Unit test bundle",
          "result": "Failed",
          "children": [
            {
              "name": "LoginTests",
              "nodeType": "Test Suite",
              "nodeIdentifier": "LoginTests",
              "result": "Passed",
              "children": [
                {
                  "name": "testValidLogin()",
                  "nodeType": "Test Case",
                  "nodeIdentifier": "LoginTests/testValidLogin()",
                  "result": "Passed",
                  "duration": "0.25s"
                },
                {
                  "name": "testBadPassword()",
                  "nodeType": "Test Case",
                  "nodeIdentifier": "LoginTests/testBadPassword()",
                  "result": "Failed",
                  "duration": "1,5s",
                  "children": [
                    {"name": "LoginTests.swift:42: XCTAssertEqual failed: (\"401\") is not equal to (\"200\")", "nodeType": "Failure Message"},
                    {"name": "Device", "nodeType": "Device", "children": [
                      {"name": "Screenshot_1.png", "nodeType": "Attachment"}
                    ]}
                  ]
                },
                {
                  "name": "testBiometric()",
                  "nodeType": "Test Case",
                  "nodeIdentifier": "LoginTests/testBiometric()",
                  "result": "Skipped",
                  "children": [
                    {"name": "Test skipped - Face ID unavailable", "nodeType": "Failure Message"}
                  ]
                },
                {
                  "name": "testKnownIssue()",
                  "nodeType": "Test Case",
                  "nodeIdentifier": "LoginTests/testKnownIssue()",
                  "result": "Expected Failure",
                  "children": [
                    {"name": "Tracked in a known issue", "nodeType": "Failure Message"}
                  ]
                }
              ]
            },
            {
              "name": "EmptySuite",
              "nodeType": "Test Suite",
              "result": "Passed",
              "children": []
            }
          ]
        }
      ]
    }
  ]
}"#;

/// Attachment export manifest for the failing login case.
pub const MANIFEST: &str = r#"[
  {
    "testIdentifier": "LoginTests/testBadPassword()",
    "testIdentifierURL": "test://com.apple.xcode/App/AppTests/LoginTests/testBadPassword()",
    "attachments": [
      {"exportedFileName": "shot_1.png", "suggestedHumanReadableName": "Screenshot"},
      {"exportedFileName": "shot_2.png"}
    ]
  }
]"#;
